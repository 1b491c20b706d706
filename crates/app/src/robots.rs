//! Demo arms.

use std::str::FromStr;

use anyhow::{Result, anyhow};
use corelib::DVec3;
use corelib::camera::Camera;
use corelib::chain::Chain;
use corelib::link::{DhParams, LinkConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Robot {
    /// Revolute + prismatic two-link arm.
    Planar,
    /// Universal Robots UR5, six revolute joints.
    Ur5,
}

impl FromStr for Robot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "planar" | "2link" => Ok(Robot::Planar),
            "ur5" => Ok(Robot::Ur5),
            other => Err(anyhow!("unknown robot '{other}'")),
        }
    }
}

// (a, alpha, d, theta), every joint at q = 30°
const UR5_DH: [(f64, f64, f64, f64); 6] = [
    (0.0, 90.0, 0.089159, 0.0),
    (-0.425, 0.0, 0.0, -90.0),
    (-0.39225, 0.0, 0.0, 0.0),
    (0.0, 90.0, 0.10915, -90.0),
    (0.0, 90.0, 0.09465, 0.0),
    (0.0, 0.0, 0.0823, 0.0),
];

impl Robot {
    pub fn build(self) -> Result<Chain> {
        match self {
            Robot::Planar => {
                let mut chain = Chain::new("0, joint 1");
                chain.push(
                    LinkConfig::revolute(DhParams::new(1.0, -90.0, 0.0, 0.0), 45.0)
                        .named("1, joint 2"),
                )?;
                chain.push(
                    LinkConfig::prismatic(DhParams::new(1.0, 0.0, 0.0, 0.0), 0.5)
                        .named("2, joint 3"),
                )?;
                Ok(chain)
            }
            Robot::Ur5 => {
                let mut chain = Chain::new("O");
                for (i, (a, alpha, d, theta)) in UR5_DH.into_iter().enumerate() {
                    chain.push(
                        LinkConfig::revolute(DhParams::new(a, alpha, d, theta), 30.0)
                            .named(format!("L{}", i + 1))
                            .with_scale(0.5),
                    )?;
                }
                Ok(chain)
            }
        }
    }

    /// Viewer camera, expressed in the root frame.
    pub fn camera(self, chain: &Chain, fov_y_rad: f64) -> Result<Camera> {
        let (forward, up) = match self {
            Robot::Planar => (DVec3::NEG_Z, DVec3::Y),
            Robot::Ur5 => (DVec3::new(-1.0, -1.0, -1.0), DVec3::Z),
        };
        Ok(Camera::in_frame(chain.tree(), chain.root(), DVec3::ZERO, forward, up)?.with_fov(fov_y_rad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robots_build() {
        let planar = Robot::Planar.build().unwrap();
        assert_eq!(planar.len(), 2);
        let ur5 = Robot::Ur5.build().unwrap();
        assert_eq!(ur5.len(), 6);
        assert_eq!(ur5.joint_values(), vec![30.0; 6]);
        assert_eq!(ur5.tree().depth(ur5.end_effector()).unwrap(), 6);
        assert!(
            ur5.tree()
                .world_translation(ur5.end_effector(), DVec3::ZERO)
                .unwrap()
                .is_finite()
        );
    }

    #[test]
    fn ur5_camera_looks_down_the_diagonal() {
        let ur5 = Robot::Ur5.build().unwrap();
        let cam = Robot::Ur5.camera(&ur5, 0.5).unwrap();
        assert_eq!(cam.fov_y_rad, 0.5);
        assert_eq!(cam.up, DVec3::Z);
        let c = cam.view(3.0).transform_point3(cam.center);
        assert!(c.abs_diff_eq(DVec3::new(0.0, 0.0, -3.0), 1e-9));
    }

    #[test]
    fn robot_names_parse() {
        assert_eq!("UR5".parse::<Robot>().unwrap(), Robot::Ur5);
        assert!("puma".parse::<Robot>().is_err());
    }
}
