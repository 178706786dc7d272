//! Easing curves for tween progress, named the way scroll-animation tooling names them
//! (`power2.out`, `sine.inOut`, `none`).

use std::{f32::consts::FRAC_PI_2, f32::consts::PI, fmt, str::FromStr};

use serde::Deserialize;

use crate::animation::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EaseDirection {
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Ease {
    /// No easing.
    Linear,
    /// Polynomial ease of degree `n + 1`; `power1` is quadratic.
    Power(u8, EaseDirection),
    Sine(EaseDirection),
}

impl Default for Ease {
    fn default() -> Self {
        Ease::Power(2, EaseDirection::Out)
    }
}

impl Ease {
    /// Maps a normalized time in `[0, 1]` to eased progress. Inputs are clamped, and the
    /// end points are exact: `apply(0) == 0`, `apply(1) == 1`.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }

        match *self {
            Ease::Linear => t,
            Ease::Power(power, direction) => {
                let exponent = i32::from(power) + 1;
                match direction {
                    EaseDirection::In => t.powi(exponent),
                    EaseDirection::Out => 1.0 - (1.0 - t).powi(exponent),
                    EaseDirection::InOut => {
                        if t < 0.5 {
                            (2.0 * t).powi(exponent) / 2.0
                        } else {
                            1.0 - (2.0 * (1.0 - t)).powi(exponent) / 2.0
                        }
                    }
                }
            }
            Ease::Sine(direction) => match direction {
                EaseDirection::In => 1.0 - (t * FRAC_PI_2).cos(),
                EaseDirection::Out => (t * FRAC_PI_2).sin(),
                EaseDirection::InOut => -((PI * t).cos() - 1.0) / 2.0,
            },
        }
    }
}

impl FromStr for EaseDirection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(EaseDirection::In),
            "out" => Ok(EaseDirection::Out),
            "inOut" => Ok(EaseDirection::InOut),
            other => Err(ParseError::UnknownEase(other.to_string())),
        }
    }
}

impl FromStr for Ease {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (family, direction) = match s.split_once('.') {
            Some((family, direction)) => (family, direction.parse()?),
            None => (s, EaseDirection::Out),
        };

        match family {
            "none" | "linear" => Ok(Ease::Linear),
            "sine" => Ok(Ease::Sine(direction)),
            "power0" => Ok(Ease::Linear),
            _ => {
                let power = family
                    .strip_prefix("power")
                    .and_then(|n| n.parse::<u8>().ok())
                    .filter(|n| (1..=4).contains(n))
                    .ok_or_else(|| ParseError::UnknownEase(s.to_string()))?;
                Ok(Ease::Power(power, direction))
            }
        }
    }
}

impl TryFrom<String> for Ease {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = |direction: EaseDirection| match direction {
            EaseDirection::In => "in",
            EaseDirection::Out => "out",
            EaseDirection::InOut => "inOut",
        };

        match *self {
            Ease::Linear => f.write_str("none"),
            Ease::Power(power, d) => write!(f, "power{}.{}", power, direction(d)),
            Ease::Sine(d) => write!(f, "sine.{}", direction(d)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [&str; 8] = [
        "none",
        "power1.in",
        "power2.out",
        "power3.inOut",
        "power4.out",
        "sine.in",
        "sine.out",
        "sine.inOut",
    ];

    #[test]
    fn end_points_are_exact() {
        for name in ALL {
            let ease: Ease = name.parse().unwrap();
            assert_eq!(ease.apply(0.0), 0.0, "{name}");
            assert_eq!(ease.apply(1.0), 1.0, "{name}");
        }
    }

    #[test]
    fn curves_are_monotonic() {
        for name in ALL {
            let ease: Ease = name.parse().unwrap();
            let mut previous = 0.0;
            for step in 1..=100 {
                let value = ease.apply(step as f32 / 100.0);
                assert!(value >= previous - 1e-6, "{name} at step {step}");
                previous = value;
            }
        }
    }

    #[test]
    fn power2_out_is_cubic() {
        let ease = Ease::Power(2, EaseDirection::Out);
        assert!((ease.apply(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn bare_power_defaults_to_out() {
        assert_eq!("power3".parse::<Ease>().unwrap(), Ease::Power(3, EaseDirection::Out));
        assert_eq!("linear".parse::<Ease>().unwrap(), Ease::Linear);
        assert_eq!(Ease::default().to_string(), "power2.out");
    }

    #[test]
    fn rejects_unknown_names() {
        assert!("bounce.out".parse::<Ease>().is_err());
        assert!("power9.out".parse::<Ease>().is_err());
        assert!("power2.sideways".parse::<Ease>().is_err());
    }

    #[test]
    fn clamps_out_of_range_input() {
        let ease = Ease::Sine(EaseDirection::InOut);
        assert_eq!(ease.apply(-1.0), 0.0);
        assert_eq!(ease.apply(2.0), 1.0);
    }
}
