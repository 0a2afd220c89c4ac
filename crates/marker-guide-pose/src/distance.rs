use std::fmt;

use serde::{Deserialize, Serialize};

/// Distance rounded to the nearest half foot, as announced to the user.
///
/// Inches `3..=9` past a whole foot read as "and a half"; more than nine
/// inches round up to the next foot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpokenDistance {
    pub feet: u32,
    pub and_a_half: bool,
}

impl SpokenDistance {
    pub fn from_inches(distance: u32) -> Self {
        let mut feet = distance / 12;
        let inches = distance % 12;
        let and_a_half = (3..=9).contains(&inches);
        if inches > 9 {
            feet += 1;
        }
        Self { feet, and_a_half }
    }

    fn qualifier(&self) -> &'static str {
        if self.and_a_half {
            "and a half "
        } else {
            ""
        }
    }
}

impl fmt::Display for SpokenDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Distance {} {}feet", self.feet, self.qualifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_feet_have_no_qualifier() {
        let d = SpokenDistance::from_inches(26);
        assert_eq!(d, SpokenDistance { feet: 2, and_a_half: false });
        assert_eq!(d.to_string(), "Distance 2 feet");
    }

    #[test]
    fn mid_foot_reads_as_half() {
        assert_eq!(
            SpokenDistance::from_inches(30).to_string(),
            "Distance 2 and a half feet"
        );
        assert!(SpokenDistance::from_inches(27).and_a_half);
        assert!(SpokenDistance::from_inches(33).and_a_half);
    }

    #[test]
    fn late_inches_round_up() {
        assert_eq!(SpokenDistance::from_inches(35).to_string(), "Distance 3 feet");
        assert_eq!(SpokenDistance::from_inches(34).feet, 3);
        assert_eq!(SpokenDistance::from_inches(11).to_string(), "Distance 1 feet");
    }

    #[test]
    fn under_three_inches_rounds_down() {
        assert_eq!(SpokenDistance::from_inches(0).to_string(), "Distance 0 feet");
        assert_eq!(SpokenDistance::from_inches(14).to_string(), "Distance 1 feet");
    }
}
