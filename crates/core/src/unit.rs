use std::str::FromStr;

use crate::error::CoreError;

/// Unit in which angles are handed to constructors and link parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    #[inline]
    pub fn to_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Degrees => angle.to_radians(),
            AngleUnit::Radians => angle,
        }
    }
}

impl FromStr for AngleUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deg" | "degree" | "degrees" => Ok(AngleUnit::Degrees),
            "rad" | "radian" | "radians" => Ok(AngleUnit::Radians),
            other => Err(CoreError::UnknownUnit(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_convert_to_radians() {
        let rad = AngleUnit::Degrees.to_radians(180.0);
        assert!((rad - std::f64::consts::PI).abs() < 1e-12);
        assert_eq!(AngleUnit::Radians.to_radians(0.5), 0.5);
    }

    #[test]
    fn parse_unit_names() {
        assert_eq!("deg".parse::<AngleUnit>().unwrap(), AngleUnit::Degrees);
        assert_eq!("RAD".parse::<AngleUnit>().unwrap(), AngleUnit::Radians);
        assert!(matches!(
            "grad".parse::<AngleUnit>(),
            Err(CoreError::UnknownUnit(_))
        ));
    }
}
