/// Attack-roll multiplier for a d20 result.
///
/// ```text
/// roll  1..=5   -> 1 / (6 - roll)   (1/5, 1/4, 1/3, 1/2, 1)
/// roll  6..=10  -> 1.0
/// roll 11..=20  -> roll - 10        (1x through 10x)
/// ```
///
/// Out-of-range rolls are clamped to the die.
pub fn attack_roll_multiplier(roll: u32) -> f64 {
    let roll = roll.clamp(1, 20);
    match roll {
        1..=5 => 1.0 / f64::from(6 - roll),
        6..=10 => 1.0,
        _ => f64::from(roll - 10),
    }
}
