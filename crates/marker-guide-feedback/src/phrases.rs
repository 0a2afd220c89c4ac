use marker_guide_pose::SpokenDistance;

/// Orientation phrase for a smoothed orientation angle.
///
/// The spoken value is the negated smoothed angle, so the user hears the
/// pitch of the decomposition rather than the smoothed `-pitch`.
pub fn orientation_phrase(orientation: i32) -> String {
    format!("Orientation {} degrees", -i64::from(orientation))
}

/// The two phrases of an announcement, in speaking order.
pub fn announcement(distance: u32, orientation: i32) -> [String; 2] {
    [
        SpokenDistance::from_inches(distance).to_string(),
        orientation_phrase(orientation),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_sign_is_flipped() {
        assert_eq!(orientation_phrase(12), "Orientation -12 degrees");
        assert_eq!(orientation_phrase(-4), "Orientation 4 degrees");
        assert_eq!(orientation_phrase(0), "Orientation 0 degrees");
    }

    #[test]
    fn distance_comes_first() {
        assert_eq!(
            announcement(35, -3),
            [
                "Distance 3 feet".to_string(),
                "Orientation 3 degrees".to_string()
            ]
        );
    }
}
