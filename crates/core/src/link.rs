//! One joint + link of a serial chain, described by Denavit-Hartenberg
//! parameters.
//!
//! The output frame pose is `H = Hq · Hθ · Hd · Ha · Hα`. Setters only record
//! the new value and mark the field dirty; [`Link::recompute`] then rebuilds
//! the dirty elementary transforms, recomposes `H`, pushes it into the output
//! frame, regenerates the mesh shape and notifies shape observers, in that
//! order.

use std::fmt;
use std::str::FromStr;

use crate::DVec3;
use crate::error::{CoreError, CoreResult};
use crate::frames::{FrameId, FrameTree};
use crate::se3::Transform;
use crate::unit::AngleUnit;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum JointType {
    #[default]
    Revolute,
    Prismatic,
}

impl FromStr for JointType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "r" | "revolute" => Ok(JointType::Revolute),
            "p" | "prismatic" => Ok(JointType::Prismatic),
            other => Err(CoreError::UnknownJoint(other.to_string())),
        }
    }
}

/// Mutable link field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DhField {
    Q,
    Theta,
    D,
    A,
    Alpha,
}

impl DhField {
    /// Composition order of the elementary transforms.
    pub const ALL: [DhField; 5] = [
        DhField::Q,
        DhField::Theta,
        DhField::D,
        DhField::A,
        DhField::Alpha,
    ];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << self.slot()
    }

    pub fn name(self) -> &'static str {
        match self {
            DhField::Q => "q",
            DhField::Theta => "theta",
            DhField::D => "d",
            DhField::A => "a",
            DhField::Alpha => "alpha",
        }
    }
}

impl fmt::Display for DhField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DhField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DhField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| CoreError::UnknownField(s.to_string()))
    }
}

/// The four fixed DH parameters; `alpha` and `theta` are in the link's unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DhParams {
    /// Link length, along x.
    pub a: f64,
    /// Link twist, about x.
    pub alpha: f64,
    /// Link offset, along z.
    pub d: f64,
    /// Joint angle, about z.
    pub theta: f64,
}

impl DhParams {
    pub const fn new(a: f64, alpha: f64, d: f64, theta: f64) -> Self {
        Self { a, alpha, d, theta }
    }
}

impl Default for DhParams {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinkConfig {
    pub params: DhParams,
    /// Joint variable: an angle (revolute, in `unit`) or a distance (prismatic).
    pub q: f64,
    pub joint: JointType,
    pub unit: AngleUnit,
    pub name: String,
    /// Size of the link visuals.
    pub scale: f64,
}

impl LinkConfig {
    pub fn revolute(params: DhParams, q: f64) -> Self {
        Self {
            params,
            q,
            joint: JointType::Revolute,
            ..Self::default()
        }
    }

    pub fn prismatic(params: DhParams, q: f64) -> Self {
        Self {
            params,
            q,
            joint: JointType::Prismatic,
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_unit(mut self, unit: AngleUnit) -> Self {
        self.unit = unit;
        self
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            params: DhParams::default(),
            q: 0.0,
            joint: JointType::Revolute,
            unit: AngleUnit::Degrees,
            name: String::new(),
            scale: 1.0,
        }
    }
}

/// Cylinder marker placed in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hinge {
    pub position: DVec3,
    pub axis: DVec3,
    pub radius: f64,
}

/// Rounded-rectangle cross-section of the link body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrossSection {
    pub width: f64,
    pub height: f64,
    pub roundness: f64,
}

/// Samples of the S-shaped bend between the `a` and `d` extents.
///
/// The longer extent is sampled uniformly with `int(2 + 50·ratio)` points,
/// the other follows a logistic curve of steepness `500/n`. With `a = d = 0`
/// there is a single zero sample.
pub fn bend_samples(a: f64, d: f64, scale: f64) -> (Vec<f64>, Vec<f64>) {
    if a == 0.0 && d == 0.0 {
        return (vec![0.0], vec![0.0]);
    }
    let logistic = |t: f64, beta: f64| 1.0 / (1.0 + (-beta * (t - 0.5)).exp());
    if a.abs() >= d.abs() {
        let n = (2.0 + 50.0 * (d / a).abs()) as usize;
        let beta = 500.0 / n as f64;
        let x: Vec<f64> = linspace(0.1 * scale, a.abs() - 0.1 * scale, n)
            .map(|v| a.signum() * v)
            .collect();
        let z = x.iter().map(|&xi| d * logistic(xi / a, beta)).collect();
        (x, z)
    } else {
        let n = (2.0 + 50.0 * (a / d).abs()) as usize;
        let beta = 500.0 / n as f64;
        let z: Vec<f64> = linspace(0.0, d.abs(), n).map(|v| d.signum() * v).collect();
        let x = z.iter().map(|&zi| a * logistic(zi / d, beta)).collect();
        (x, z)
    }
}

fn linspace(start: f64, stop: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = if n > 1 {
        (stop - start) / (n - 1) as f64
    } else {
        0.0
    };
    (0..n).map(move |i| start + step * i as f64)
}

/// Procedural geometry of a link, expressed in the parent frame except for
/// the tip hinge which sits in the link's own frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkShape {
    x: Vec<f64>,
    z: Vec<f64>,
    path: Vec<DVec3>,
    twist: f64,
    cross_section: CrossSection,
    base_hinge: Hinge,
    tip_hinge: Hinge,
    travel: Option<Hinge>,
}

impl LinkShape {
    pub fn generate(
        params: &DhParams,
        q: f64,
        joint: JointType,
        unit: AngleUnit,
        scale: f64,
    ) -> Self {
        let (x, z) = bend_samples(params.a, params.d, scale);
        let (angle, lift) = match joint {
            JointType::Revolute => (unit.to_radians(q + params.theta), 0.0),
            JointType::Prismatic => (unit.to_radians(params.theta), q),
        };
        let (sin, cos) = angle.sin_cos();
        let path = x
            .iter()
            .zip(&z)
            .map(|(&xi, &zi)| DVec3::new(cos * xi, sin * xi, zi + lift))
            .collect();
        let twist = -unit.to_radians(params.alpha) / x.len() as f64;

        let hinge_axis = DVec3::new(0.0, 0.0, 0.05 * scale);
        let base_z = match joint {
            JointType::Revolute => 0.0,
            JointType::Prismatic => q,
        };
        let travel = (joint == JointType::Prismatic).then(|| Hinge {
            position: DVec3::ZERO,
            axis: DVec3::new(0.0, 0.0, q),
            radius: 0.04 * scale,
        });

        Self {
            x,
            z,
            path,
            twist,
            cross_section: CrossSection {
                width: 0.1 * scale,
                height: 0.05 * scale,
                roundness: 0.2,
            },
            base_hinge: Hinge {
                position: DVec3::new(0.0, 0.0, base_z),
                axis: hinge_axis,
                radius: 0.1 * scale,
            },
            tip_hinge: Hinge {
                position: DVec3::new(0.0, 0.0, -0.05 * scale),
                axis: hinge_axis,
                radius: 0.1 * scale,
            },
            travel,
        }
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.x.len()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// Sweep path of the link body.
    pub fn path(&self) -> &[DVec3] {
        &self.path
    }

    /// Twist per sample, radians.
    pub fn twist(&self) -> f64 {
        self.twist
    }

    pub fn cross_section(&self) -> CrossSection {
        self.cross_section
    }

    pub fn base_hinge(&self) -> Hinge {
        self.base_hinge
    }

    pub fn tip_hinge(&self) -> Hinge {
        self.tip_hinge
    }

    /// Prismatic travel marker.
    pub fn travel(&self) -> Option<Hinge> {
        self.travel
    }

    /// True when the whole path collapses to one point.
    pub fn is_degenerate(&self) -> bool {
        self.path
            .first()
            .is_none_or(|p0| self.path.iter().all(|p| p.distance(*p0) < 1e-12))
    }
}

/// What a shape observer gets after every recompute.
#[derive(Clone, Copy, Debug)]
pub struct ShapeUpdate<'a> {
    /// Frame the link is mounted on; the body and base hinge live here.
    pub parent: FrameId,
    /// The link's own output frame; the tip hinge lives here.
    pub frame: FrameId,
    pub joint: JointType,
    pub shape: &'a LinkShape,
    pub revision: u64,
}

pub trait ShapeObserver: Send {
    fn shape_changed(&mut self, update: &ShapeUpdate<'_>);
}

pub struct Link {
    params: DhParams,
    q: f64,
    joint: JointType,
    unit: AngleUnit,
    scale: f64,
    /// Elementary transforms in composition order, indexed by `DhField::slot`.
    elementary: [Transform; 5],
    hom: Transform,
    parent: FrameId,
    frame: FrameId,
    shape: LinkShape,
    dirty: u8,
    revision: u64,
    observers: Vec<Box<dyn ShapeObserver>>,
}

impl Link {
    /// Create the link and insert its output frame under `parent`.
    pub fn attach(tree: &mut FrameTree, parent: FrameId, config: LinkConfig) -> CoreResult<Self> {
        let LinkConfig {
            params,
            q,
            joint,
            unit,
            name,
            scale,
        } = config;
        for (what, value) in [
            ("q", q),
            ("theta", params.theta),
            ("d", params.d),
            ("a", params.a),
            ("alpha", params.alpha),
            ("scale", scale),
        ] {
            ensure_finite(what, value)?;
        }
        let mut elementary = [Transform::IDENTITY; 5];
        for field in DhField::ALL {
            elementary[field.slot()] = elementary_transform(field, &params, q, joint, unit)?;
        }
        let hom = compose_chain(&elementary);
        let frame = tree.insert_pose(name, hom, Some(parent))?;
        let shape = LinkShape::generate(&params, q, joint, unit, scale);
        log::debug!("link attached: frame {frame} on {parent}, {joint:?}, {params:?}, q={q}");
        Ok(Self {
            params,
            q,
            joint,
            unit,
            scale,
            elementary,
            hom,
            parent,
            frame,
            shape,
            dirty: 0,
            revision: 0,
            observers: Vec::new(),
        })
    }

    // ----- accessors -----

    #[inline]
    pub fn params(&self) -> DhParams {
        self.params
    }

    #[inline]
    pub fn q(&self) -> f64 {
        self.q
    }

    #[inline]
    pub fn joint(&self) -> JointType {
        self.joint
    }

    #[inline]
    pub fn unit(&self) -> AngleUnit {
        self.unit
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Frame the link is mounted on.
    #[inline]
    pub fn parent_frame(&self) -> FrameId {
        self.parent
    }

    /// Output frame.
    #[inline]
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    /// Composed transform as of the last recompute.
    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.hom
    }

    /// Elementary transform of one field as of the last recompute.
    #[inline]
    pub fn elementary(&self, field: DhField) -> &Transform {
        &self.elementary[field.slot()]
    }

    #[inline]
    pub fn shape(&self) -> &LinkShape {
        &self.shape
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty != 0
    }

    pub fn get(&self, field: DhField) -> f64 {
        match field {
            DhField::Q => self.q,
            DhField::Theta => self.params.theta,
            DhField::D => self.params.d,
            DhField::A => self.params.a,
            DhField::Alpha => self.params.alpha,
        }
    }

    // ----- setters (deferred until recompute) -----

    pub fn set(&mut self, field: DhField, value: f64) -> CoreResult<()> {
        ensure_finite(field.name(), value)?;
        let slot = match field {
            DhField::Q => &mut self.q,
            DhField::Theta => &mut self.params.theta,
            DhField::D => &mut self.params.d,
            DhField::A => &mut self.params.a,
            DhField::Alpha => &mut self.params.alpha,
        };
        *slot = value;
        self.dirty |= field.bit();
        Ok(())
    }

    /// Add `delta` to the current value of `field`.
    pub fn nudge(&mut self, field: DhField, delta: f64) -> CoreResult<()> {
        self.set(field, self.get(field) + delta)
    }

    pub fn set_q(&mut self, q: f64) -> CoreResult<()> {
        self.set(DhField::Q, q)
    }

    pub fn set_theta(&mut self, theta: f64) -> CoreResult<()> {
        self.set(DhField::Theta, theta)
    }

    pub fn set_d(&mut self, d: f64) -> CoreResult<()> {
        self.set(DhField::D, d)
    }

    pub fn set_a(&mut self, a: f64) -> CoreResult<()> {
        self.set(DhField::A, a)
    }

    pub fn set_alpha(&mut self, alpha: f64) -> CoreResult<()> {
        self.set(DhField::Alpha, alpha)
    }

    /// Set one field and recompute immediately.
    pub fn update(&mut self, tree: &mut FrameTree, field: DhField, value: f64) -> CoreResult<()> {
        self.set(field, value)?;
        self.recompute(tree)?;
        Ok(())
    }

    /// Run the pipeline for the fields changed since the last call.
    ///
    /// Returns `false` when nothing was dirty.
    pub fn recompute(&mut self, tree: &mut FrameTree) -> CoreResult<bool> {
        if self.dirty == 0 {
            return Ok(false);
        }
        let mut elementary = self.elementary;
        for field in DhField::ALL {
            if self.dirty & field.bit() != 0 {
                elementary[field.slot()] =
                    elementary_transform(field, &self.params, self.q, self.joint, self.unit)?;
            }
        }
        let hom = compose_chain(&elementary);
        tree.set_pose(self.frame, hom)?;

        self.elementary = elementary;
        self.hom = hom;
        self.dirty = 0;
        self.shape = LinkShape::generate(&self.params, self.q, self.joint, self.unit, self.scale);
        self.revision += 1;
        log::debug!(
            "link {} recomputed (rev {}): {} samples",
            self.frame,
            self.revision,
            self.shape.sample_count()
        );
        self.notify();
        Ok(true)
    }

    /// Register a shape observer; it immediately receives the current shape.
    pub fn subscribe(&mut self, mut observer: Box<dyn ShapeObserver>) {
        observer.shape_changed(&self.update_view());
        self.observers.push(observer);
    }

    fn update_view(&self) -> ShapeUpdate<'_> {
        ShapeUpdate {
            parent: self.parent,
            frame: self.frame,
            joint: self.joint,
            shape: &self.shape,
            revision: self.revision,
        }
    }

    fn notify(&mut self) {
        let update = ShapeUpdate {
            parent: self.parent,
            frame: self.frame,
            joint: self.joint,
            shape: &self.shape,
            revision: self.revision,
        };
        for observer in &mut self.observers {
            observer.shape_changed(&update);
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("params", &self.params)
            .field("q", &self.q)
            .field("joint", &self.joint)
            .field("unit", &self.unit)
            .field("frame", &self.frame)
            .field("parent", &self.parent)
            .field("revision", &self.revision)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

fn ensure_finite(what: &'static str, value: f64) -> CoreResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CoreError::NonFinite { what, value })
    }
}

fn elementary_transform(
    field: DhField,
    params: &DhParams,
    q: f64,
    joint: JointType,
    unit: AngleUnit,
) -> CoreResult<Transform> {
    match field {
        DhField::Q => match joint {
            JointType::Revolute => Transform::new(DVec3::ZERO, q, DVec3::Z, unit),
            JointType::Prismatic => Ok(Transform::from_translation(DVec3::new(0.0, 0.0, q))),
        },
        DhField::Theta => Transform::new(DVec3::ZERO, params.theta, DVec3::Z, unit),
        DhField::D => Ok(Transform::from_translation(DVec3::new(0.0, 0.0, params.d))),
        DhField::A => Ok(Transform::from_translation(DVec3::new(params.a, 0.0, 0.0))),
        DhField::Alpha => Transform::new(DVec3::ZERO, params.alpha, DVec3::X, unit),
    }
}

fn compose_chain(elementary: &[Transform; 5]) -> Transform {
    elementary
        .iter()
        .fold(Transform::IDENTITY, |acc, h| acc * *h)
}
