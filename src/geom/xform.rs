//! Xform (transform) schema.
//!
//! An Xform prim carries an ordered stack of transform ops. Each op is an
//! attribute named `xformOp:<kind>[:<suffix>]`, and the `xformOpOrder` token
//! array lists the ops to apply, outermost first. An entry prefixed with
//! `!invert!` applies the inverse of that op.

use glam::{DMat4, DVec3};
use std::ops::{Deref, DerefMut};

use crate::core::{IntoPath, TimeCode, Value};
use crate::usd::{Prim, PrimMut, Stage};
use crate::util::{Error, Result};

/// Type token of Xform prims.
pub const XFORM_TYPE: &str = "Xform";

/// Name of the op order attribute.
pub const XFORM_OP_ORDER: &str = "xformOpOrder";

/// Namespace prefix of op attributes.
pub const XFORM_OP_PREFIX: &str = "xformOp:";

/// Op order prefix that applies an op inverted.
pub const INVERT_PREFIX: &str = "!invert!";

/// Op order entry that discards parent transforms.
pub const RESET_XFORM_STACK: &str = "!resetXformStack!";

/// Transform operation type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum XformOpType {
    Translate,
    Scale,
    RotateX,
    RotateY,
    RotateZ,
    /// Euler rotation in degrees, X applied first.
    RotateXYZ,
    /// Full 4x4 matrix.
    Transform,
}

impl XformOpType {
    pub const ALL: [XformOpType; 7] = [
        XformOpType::Translate,
        XformOpType::Scale,
        XformOpType::RotateX,
        XformOpType::RotateY,
        XformOpType::RotateZ,
        XformOpType::RotateXYZ,
        XformOpType::Transform,
    ];

    /// Token used in attribute names, e.g. "rotateX".
    pub const fn token(self) -> &'static str {
        match self {
            XformOpType::Translate => "translate",
            XformOpType::Scale => "scale",
            XformOpType::RotateX => "rotateX",
            XformOpType::RotateY => "rotateY",
            XformOpType::RotateZ => "rotateZ",
            XformOpType::RotateXYZ => "rotateXYZ",
            XformOpType::Transform => "transform",
        }
    }

    /// Value type the op attribute is created with.
    pub const fn value_type_name(self) -> &'static str {
        match self {
            XformOpType::Translate | XformOpType::Scale | XformOpType::RotateXYZ => "Double3",
            XformOpType::RotateX | XformOpType::RotateY | XformOpType::RotateZ => "Double",
            XformOpType::Transform => "Matrix4d",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.token() == token)
    }

    /// Attribute name for this op with an optional suffix.
    pub fn op_name(self, suffix: Option<&str>) -> String {
        match suffix {
            Some(suffix) => format!("{}{}:{}", XFORM_OP_PREFIX, self.token(), suffix),
            None => format!("{}{}", XFORM_OP_PREFIX, self.token()),
        }
    }

    /// Matrix for a resolved op value.
    fn matrix(self, name: &str, value: &Value) -> Result<DMat4> {
        let bad_value = || {
            Error::invalid_value(
                self.value_type_name(),
                format!("op '{}' holds {}", name, value.scalar_type()),
            )
        };

        let m = match self {
            XformOpType::Translate => DMat4::from_translation(vec3(value).ok_or_else(bad_value)?),
            XformOpType::Scale => DMat4::from_scale(vec3(value).ok_or_else(bad_value)?),
            XformOpType::RotateX => {
                DMat4::from_rotation_x(angle(value).ok_or_else(bad_value)?.to_radians())
            }
            XformOpType::RotateY => {
                DMat4::from_rotation_y(angle(value).ok_or_else(bad_value)?.to_radians())
            }
            XformOpType::RotateZ => {
                DMat4::from_rotation_z(angle(value).ok_or_else(bad_value)?.to_radians())
            }
            XformOpType::RotateXYZ => {
                let r = vec3(value).ok_or_else(bad_value)?;
                DMat4::from_rotation_z(r.z.to_radians())
                    * DMat4::from_rotation_y(r.y.to_radians())
                    * DMat4::from_rotation_x(r.x.to_radians())
            }
            XformOpType::Transform => value.get::<DMat4>().ok_or_else(bad_value)?,
        };
        Ok(m)
    }
}

fn vec3(value: &Value) -> Option<DVec3> {
    match value {
        Value::Double3(v) => Some(*v),
        Value::Float3(v) => Some(v.as_dvec3()),
        _ => None,
    }
}

fn angle(value: &Value) -> Option<f64> {
    match value {
        Value::Double(v) => Some(*v),
        Value::Float(v) => Some(f64::from(*v)),
        _ => None,
    }
}

/// Parse an op order entry into (op type, attribute name, inverted).
fn parse_op_entry(entry: &str) -> Result<(XformOpType, &str, bool)> {
    let (name, inverted) = match entry.strip_prefix(INVERT_PREFIX) {
        Some(name) => (name, true),
        None => (entry, false),
    };
    let token = name
        .strip_prefix(XFORM_OP_PREFIX)
        .and_then(|rest| rest.split(':').next())
        .ok_or_else(|| Error::invalid_value("xformOpOrder", format!("'{}' is not an op", entry)))?;
    let op_type = XformOpType::from_token(token).ok_or_else(|| {
        Error::invalid_value("xformOpOrder", format!("unsupported op '{}'", token))
    })?;
    Ok((op_type, name, inverted))
}

/// Op order of a prim; empty when unauthored.
pub fn op_order(prim: &Prim<'_>) -> Vec<String> {
    prim.attribute(XFORM_OP_ORDER)
        .and_then(|attr| attr.get())
        .and_then(Value::as_token_array)
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

/// Returns true if the op order starts with `!resetXformStack!`.
pub fn resets_xform_stack(prim: &Prim<'_>) -> bool {
    op_order(prim).first().map(String::as_str) == Some(RESET_XFORM_STACK)
}

/// Compose the prim's ops at `time` into its local matrix.
///
/// Prims without an op order get the identity. Op values resolve with the
/// stage's interpolation setting.
pub fn local_transform(prim: &Prim<'_>, time: impl Into<TimeCode>) -> Result<DMat4> {
    let time = time.into();
    let mut result = DMat4::IDENTITY;

    for entry in op_order(prim) {
        if entry == RESET_XFORM_STACK {
            continue;
        }
        let (op_type, name, inverted) = parse_op_entry(&entry)?;
        let value = prim.attribute_value_at(name, time).ok_or_else(|| {
            Error::not_found(format!("value of <{}.{}>", prim.path(), name))
        })?;
        let m = op_type.matrix(name, &value)?;
        result *= if inverted { m.inverse() } else { m };
    }
    Ok(result)
}

/// Compose local transforms from the root down to `prim`.
///
/// Walking stops at the first prim whose op order resets the xform stack.
pub fn world_transform(prim: &Prim<'_>, time: impl Into<TimeCode>) -> Result<DMat4> {
    let time = time.into();
    let mut result = DMat4::IDENTITY;
    let mut current = Some(*prim);

    while let Some(p) = current {
        if p.is_pseudo_root() {
            break;
        }
        result = local_transform(&p, time)? * result;
        if resets_xform_stack(&p) {
            break;
        }
        current = p.parent();
    }
    Ok(result)
}

// ============================================================================
// Xform schema
// ============================================================================

/// Authoring wrapper for an Xform prim.
///
/// Derefs to [`PrimMut`], so attributes and children are authored as on any
/// prim.
pub struct Xform<'a> {
    prim: PrimMut<'a>,
}

impl<'a> Xform<'a> {
    /// Define an Xform prim at `path`.
    pub fn define(stage: &'a mut Stage, path: impl IntoPath) -> Result<Self> {
        let prim = stage.define_prim(path, XFORM_TYPE)?;
        Ok(Self { prim })
    }

    /// Wrap the prim at `path` if it is an Xform.
    pub fn get(stage: &'a mut Stage, path: impl IntoPath) -> Option<Self> {
        let prim = stage.prim_at_path_mut(path)?;
        if prim.type_name() == XFORM_TYPE {
            Some(Self { prim })
        } else {
            None
        }
    }

    pub fn into_prim(self) -> PrimMut<'a> {
        self.prim
    }

    /// Author an op and append it to the op order.
    ///
    /// Returns the op attribute name. Adding an op that is already in the
    /// order fails.
    pub fn add_op(
        &mut self,
        op_type: XformOpType,
        suffix: Option<&str>,
        value: impl Into<Value>,
    ) -> Result<String> {
        let name = op_type.op_name(suffix);
        let mut order = self.op_order();
        if order.iter().any(|entry| entry == &name) {
            return Err(Error::invalid_value(
                "xformOpOrder",
                format!("op '{}' is already in the order", name),
            ));
        }

        // Checked up front so a rejected value authors nothing
        let value = value.into();
        self.prim
            .stage()
            .registry()
            .resolve(op_type.value_type_name())?
            .validate(&value)?;

        self.prim
            .create_attribute(&name, op_type.value_type_name())?
            .set(value)?;

        order.push(name.clone());
        self.set_op_order(order)?;
        Ok(name)
    }

    pub fn add_translate_op(&mut self, translation: DVec3) -> Result<String> {
        self.add_op(XformOpType::Translate, None, translation)
    }

    pub fn add_scale_op(&mut self, scale: DVec3) -> Result<String> {
        self.add_op(XformOpType::Scale, None, scale)
    }

    /// Rotation about X in degrees.
    pub fn add_rotate_x_op(&mut self, degrees: f64) -> Result<String> {
        self.add_op(XformOpType::RotateX, None, degrees)
    }

    pub fn add_rotate_y_op(&mut self, degrees: f64) -> Result<String> {
        self.add_op(XformOpType::RotateY, None, degrees)
    }

    pub fn add_rotate_z_op(&mut self, degrees: f64) -> Result<String> {
        self.add_op(XformOpType::RotateZ, None, degrees)
    }

    pub fn add_rotate_xyz_op(&mut self, degrees: DVec3) -> Result<String> {
        self.add_op(XformOpType::RotateXYZ, None, degrees)
    }

    pub fn add_transform_op(&mut self, matrix: DMat4) -> Result<String> {
        self.add_op(XformOpType::Transform, None, matrix)
    }

    pub fn op_order(&self) -> Vec<String> {
        op_order(&self.prim.as_prim())
    }

    /// Replace the op order. Every entry must name an authored op or be
    /// `!resetXformStack!` in first position.
    pub fn set_op_order(&mut self, order: Vec<String>) -> Result<()> {
        for (i, entry) in order.iter().enumerate() {
            if entry == RESET_XFORM_STACK {
                if i != 0 {
                    return Err(Error::invalid_value(
                        "xformOpOrder",
                        "!resetXformStack! must come first",
                    ));
                }
                continue;
            }
            let (_, name, _) = parse_op_entry(entry)?;
            if self.prim.attribute(name).is_none() {
                return Err(Error::not_found(format!("op attribute '{}'", name)));
            }
        }

        self.prim
            .create_attribute(XFORM_OP_ORDER, "TokenArray")?
            .set(Value::TokenArray(order))
    }

    /// Discard parent transforms when computing world transforms.
    pub fn set_reset_xform_stack(&mut self, reset: bool) -> Result<()> {
        let mut order = self.op_order();
        let has_reset = order.first().map(String::as_str) == Some(RESET_XFORM_STACK);
        match (reset, has_reset) {
            (true, false) => order.insert(0, RESET_XFORM_STACK.to_string()),
            (false, true) => {
                order.remove(0);
            }
            _ => return Ok(()),
        }
        self.set_op_order(order)
    }

    /// Remove all ops from the order. Op attributes stay authored.
    pub fn clear_op_order(&mut self) -> Result<()> {
        self.set_op_order(Vec::new())
    }

    pub fn local_transform(&self, time: impl Into<TimeCode>) -> Result<DMat4> {
        local_transform(&self.prim.as_prim(), time)
    }
}

impl<'a> Deref for Xform<'a> {
    type Target = PrimMut<'a>;

    fn deref(&self) -> &Self::Target {
        &self.prim
    }
}

impl DerefMut for Xform<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.prim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: DMat4, b: DMat4) -> bool {
        a.abs_diff_eq(b, 1e-9)
    }

    #[test]
    fn test_op_names() {
        assert_eq!(XformOpType::Translate.op_name(None), "xformOp:translate");
        assert_eq!(
            XformOpType::RotateXYZ.op_name(Some("pivot")),
            "xformOp:rotateXYZ:pivot"
        );
        for op in XformOpType::ALL {
            assert_eq!(XformOpType::from_token(op.token()), Some(op));
        }
        assert_eq!(XformOpType::from_token("orient"), None);
    }

    #[test]
    fn test_define_and_get() {
        let mut stage = Stage::create_new("xf.usda").unwrap();
        {
            let mut xform = Xform::define(&mut stage, "/hello").unwrap();
            xform.create_attribute("test", "Int").unwrap();
            assert_eq!(xform.type_name(), XFORM_TYPE);
        }
        assert!(Xform::get(&mut stage, "/hello").is_some());

        stage.define_prim("/mesh", "Mesh").unwrap();
        assert!(Xform::get(&mut stage, "/mesh").is_none());
        assert!(Xform::get(&mut stage, "/missing").is_none());
    }

    #[test]
    fn test_translate_rotate_scale() {
        let mut stage = Stage::create_new("xf.usda").unwrap();
        let mut xform = Xform::define(&mut stage, "/xf").unwrap();
        xform.add_translate_op(DVec3::new(1.0, 2.0, 3.0)).unwrap();
        xform.add_rotate_z_op(90.0).unwrap();
        xform.add_scale_op(DVec3::splat(2.0)).unwrap();

        assert_eq!(
            xform.op_order(),
            ["xformOp:translate", "xformOp:rotateZ", "xformOp:scale"]
        );

        let m = xform.local_transform(0.0).unwrap();
        let expected = DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0))
            * DMat4::from_rotation_z(90f64.to_radians())
            * DMat4::from_scale(DVec3::splat(2.0));
        assert!(approx(m, expected));

        // Point on +X: scaled, rotated onto +Y, then translated
        let p = m.transform_point3(DVec3::X);
        assert!(p.abs_diff_eq(DVec3::new(1.0, 4.0, 3.0), 1e-9));
    }

    #[test]
    fn test_duplicate_op_rejected() {
        let mut stage = Stage::create_new("xf.usda").unwrap();
        let mut xform = Xform::define(&mut stage, "/xf").unwrap();
        xform.add_translate_op(DVec3::ONE).unwrap();
        assert!(xform.add_translate_op(DVec3::ONE).is_err());
        assert!(xform
            .add_op(XformOpType::Translate, Some("pivot"), DVec3::ONE)
            .is_ok());
    }

    #[test]
    fn test_rejected_op_value_authors_nothing() {
        let mut stage = Stage::create_new("xf.usda").unwrap();
        let mut xform = Xform::define(&mut stage, "/xf").unwrap();
        let err = xform
            .add_op(XformOpType::Translate, None, Value::Double(1.0))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        assert!(xform.attribute("xformOp:translate").is_none());
        assert!(xform.attribute(XFORM_OP_ORDER).is_none());
        assert_eq!(xform.as_prim().num_attributes(), 0);

        // The same op still goes in once given a proper value
        xform.add_translate_op(DVec3::ONE).unwrap();
        assert_eq!(xform.op_order(), ["xformOp:translate"]);
    }

    #[test]
    fn test_inverted_op() {
        let mut stage = Stage::create_new("xf.usda").unwrap();
        let mut xform = Xform::define(&mut stage, "/xf").unwrap();
        let pivot = xform
            .add_op(XformOpType::Translate, Some("pivot"), DVec3::new(0.0, 5.0, 0.0))
            .unwrap();
        let mut order = xform.op_order();
        order.push(format!("{}{}", INVERT_PREFIX, pivot));
        xform.set_op_order(order).unwrap();

        assert!(approx(xform.local_transform(0.0).unwrap(), DMat4::IDENTITY));
    }

    #[test]
    fn test_op_order_must_name_ops() {
        let mut stage = Stage::create_new("xf.usda").unwrap();
        let mut xform = Xform::define(&mut stage, "/xf").unwrap();
        assert!(matches!(
            xform.set_op_order(vec!["xformOp:translate".into()]),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            xform.set_op_order(vec!["translate".into()]),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_animated_translate() {
        let mut stage = Stage::create_new("xf.usda").unwrap();
        let mut xform = Xform::define(&mut stage, "/xf").unwrap();
        let name = xform.add_translate_op(DVec3::ZERO).unwrap();
        let attr = xform.attribute_mut(&name).unwrap();
        attr.set_at(0.0, DVec3::ZERO).unwrap();
        attr.set_at(10.0, DVec3::new(10.0, 0.0, 0.0)).unwrap();

        let m = xform.local_transform(5.0).unwrap();
        assert!(approx(m, DMat4::from_translation(DVec3::new(5.0, 0.0, 0.0))));
    }

    #[test]
    fn test_world_transform_and_reset() {
        let mut stage = Stage::create_new("xf.usda").unwrap();
        Xform::define(&mut stage, "/parent")
            .unwrap()
            .add_translate_op(DVec3::new(1.0, 0.0, 0.0))
            .unwrap();
        Xform::define(&mut stage, "/parent/child")
            .unwrap()
            .add_translate_op(DVec3::new(0.0, 2.0, 0.0))
            .unwrap();

        let child = stage.prim_at_path("/parent/child").unwrap();
        let world = world_transform(&child, 0.0).unwrap();
        assert!(approx(world, DMat4::from_translation(DVec3::new(1.0, 2.0, 0.0))));

        Xform::get(&mut stage, "/parent/child")
            .unwrap()
            .set_reset_xform_stack(true)
            .unwrap();
        let child = stage.prim_at_path("/parent/child").unwrap();
        assert!(resets_xform_stack(&child));
        let world = world_transform(&child, 0.0).unwrap();
        assert!(approx(world, DMat4::from_translation(DVec3::new(0.0, 2.0, 0.0))));
    }

    #[test]
    fn test_untransformed_prim_is_identity() {
        let mut stage = Stage::create_new("xf.usda").unwrap();
        stage.define_prim("/a", "").unwrap();
        let a = stage.prim_at_path("/a").unwrap();
        assert_eq!(local_transform(&a, 0.0).unwrap(), DMat4::IDENTITY);
    }
}
