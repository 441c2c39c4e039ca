//! Tagged operand values and their operators.
//!
//! A [`Variable`] is one cell of the operand stack, or an argument/return
//! value crossing the routine boundary. Exactly one payload is valid per tag;
//! the sum type makes reading the wrong payload impossible rather than a
//! silent misread.

use crate::script::context::ExecutionContext;
use crate::script::errors::ScriptError;
use std::cmp::Ordering;
use std::fmt;
use std::fmt::Display;
use std::ops::{Add, Div, Mul, Sub};
use std::sync::Arc;

/// Object id that resolves to the calling object at CONSTO time.
pub const OBJECT_SELF: u32 = 0;
/// Object id denoting "no object".
pub const OBJECT_INVALID: u32 = 1;

/// Opaque engine-side value (effect, event, location, talent) passed through
/// scripts by handle. The VM never looks inside.
pub trait EngineType: fmt::Debug + Send + Sync {}

/// Shared handle to an engine-side value; `None` is the invalid handle.
pub type EngineHandle = Option<Arc<dyn EngineType>>;

fn handles_equal(left: &EngineHandle, right: &EngineHandle) -> bool {
    match (left, right) {
        (Some(left), Some(right)) => Arc::ptr_eq(left, right),
        (None, None) => true,
        _ => false,
    }
}

/// Three-component float vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f32) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vector {
    type Output = Vector;

    fn div(self, rhs: f32) -> Vector {
        Vector::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Type tag of a [`Variable`], also used for routine signatures.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VariableType {
    Void,
    Int,
    Float,
    String,
    Vector,
    Object,
    Effect,
    Event,
    Location,
    Talent,
    Action,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableType::Void => "void",
            VariableType::Int => "int",
            VariableType::Float => "float",
            VariableType::String => "string",
            VariableType::Vector => "vector",
            VariableType::Object => "object",
            VariableType::Effect => "effect",
            VariableType::Event => "event",
            VariableType::Location => "location",
            VariableType::Talent => "talent",
            VariableType::Action => "action",
        };
        write!(f, "{}", name)
    }
}

/// One operand cell or routine argument/return value.
#[derive(Clone, Debug)]
pub enum Variable {
    Void,
    /// 32-bit signed integer.
    Int(i32),
    /// 32-bit float.
    Float(f32),
    /// UTF-8 string.
    String(String),
    /// Three-component vector. Lives on the operand stack as three float
    /// cells; the combined form exists only across the routine boundary.
    Vector(Vector),
    /// Opaque game object id.
    Object(u32),
    Effect(EngineHandle),
    Event(EngineHandle),
    Location(EngineHandle),
    Talent(EngineHandle),
    /// Deferred sub-execution context captured for an action argument.
    Action(Arc<ExecutionContext>),
}

impl Variable {
    /// Returns the type tag of this value.
    pub fn var_type(&self) -> VariableType {
        match self {
            Variable::Void => VariableType::Void,
            Variable::Int(_) => VariableType::Int,
            Variable::Float(_) => VariableType::Float,
            Variable::String(_) => VariableType::String,
            Variable::Vector(_) => VariableType::Vector,
            Variable::Object(_) => VariableType::Object,
            Variable::Effect(_) => VariableType::Effect,
            Variable::Event(_) => VariableType::Event,
            Variable::Location(_) => VariableType::Location,
            Variable::Talent(_) => VariableType::Talent,
            Variable::Action(_) => VariableType::Action,
        }
    }

    /// Returns the default/zero value for a type tag: zero numbers, the empty
    /// string, the zero vector, the invalid object id, and null handles.
    /// Used for reserved stack slots and routine-fault substitution.
    pub fn default_for(var_type: VariableType) -> Variable {
        match var_type {
            VariableType::Int => Variable::Int(0),
            VariableType::Float => Variable::Float(0.0),
            VariableType::String => Variable::String(String::new()),
            VariableType::Vector => Variable::Vector(Vector::ZERO),
            VariableType::Object => Variable::Object(OBJECT_INVALID),
            VariableType::Effect => Variable::Effect(None),
            VariableType::Event => Variable::Event(None),
            VariableType::Location => Variable::Location(None),
            VariableType::Talent => Variable::Talent(None),
            VariableType::Void | VariableType::Action => Variable::Void,
        }
    }

    fn unsupported(operation: &'static str, left: &Variable, right: &Variable) -> ScriptError {
        ScriptError::UnsupportedTypes {
            operation,
            left: left.var_type(),
            right: right.var_type(),
        }
    }

    /// Addition with int/float promotion, string concatenation, and vector
    /// addition. Integer arithmetic wraps.
    pub fn add(&self, other: &Variable) -> Result<Variable, ScriptError> {
        match (self, other) {
            (Variable::Int(left), Variable::Int(right)) => {
                Ok(Variable::Int(left.wrapping_add(*right)))
            }
            (Variable::Int(left), Variable::Float(right)) => {
                Ok(Variable::Float(*left as f32 + right))
            }
            (Variable::Float(left), Variable::Int(right)) => {
                Ok(Variable::Float(left + *right as f32))
            }
            (Variable::Float(left), Variable::Float(right)) => Ok(Variable::Float(left + right)),
            (Variable::String(left), Variable::String(right)) => {
                Ok(Variable::String(format!("{}{}", left, right)))
            }
            (Variable::Vector(left), Variable::Vector(right)) => {
                Ok(Variable::Vector(*left + *right))
            }
            _ => Err(Self::unsupported("add", self, other)),
        }
    }

    /// Subtraction with int/float promotion and vector subtraction.
    pub fn sub(&self, other: &Variable) -> Result<Variable, ScriptError> {
        match (self, other) {
            (Variable::Int(left), Variable::Int(right)) => {
                Ok(Variable::Int(left.wrapping_sub(*right)))
            }
            (Variable::Int(left), Variable::Float(right)) => {
                Ok(Variable::Float(*left as f32 - right))
            }
            (Variable::Float(left), Variable::Int(right)) => {
                Ok(Variable::Float(left - *right as f32))
            }
            (Variable::Float(left), Variable::Float(right)) => Ok(Variable::Float(left - right)),
            (Variable::Vector(left), Variable::Vector(right)) => {
                Ok(Variable::Vector(*left - *right))
            }
            _ => Err(Self::unsupported("sub", self, other)),
        }
    }

    /// Multiplication with int/float promotion and vector scaling.
    pub fn mul(&self, other: &Variable) -> Result<Variable, ScriptError> {
        match (self, other) {
            (Variable::Int(left), Variable::Int(right)) => {
                Ok(Variable::Int(left.wrapping_mul(*right)))
            }
            (Variable::Int(left), Variable::Float(right)) => {
                Ok(Variable::Float(*left as f32 * right))
            }
            (Variable::Float(left), Variable::Int(right)) => {
                Ok(Variable::Float(left * *right as f32))
            }
            (Variable::Float(left), Variable::Float(right)) => Ok(Variable::Float(left * right)),
            (Variable::Vector(left), Variable::Float(right)) => Ok(Variable::Vector(*left * *right)),
            (Variable::Float(left), Variable::Vector(right)) => Ok(Variable::Vector(*right * *left)),
            _ => Err(Self::unsupported("mul", self, other)),
        }
    }

    /// Division with int/float promotion and vector scaling. Any zero divisor
    /// is a [`ScriptError::DivisionByZero`] fault.
    pub fn div(&self, other: &Variable) -> Result<Variable, ScriptError> {
        match (self, other) {
            (Variable::Int(left), Variable::Int(right)) => {
                if *right == 0 {
                    return Err(ScriptError::DivisionByZero);
                }
                Ok(Variable::Int(left.wrapping_div(*right)))
            }
            (Variable::Int(left), Variable::Float(right)) => {
                if *right == 0.0 {
                    return Err(ScriptError::DivisionByZero);
                }
                Ok(Variable::Float(*left as f32 / right))
            }
            (Variable::Float(left), Variable::Int(right)) => {
                if *right == 0 {
                    return Err(ScriptError::DivisionByZero);
                }
                Ok(Variable::Float(left / *right as f32))
            }
            (Variable::Float(left), Variable::Float(right)) => {
                if *right == 0.0 {
                    return Err(ScriptError::DivisionByZero);
                }
                Ok(Variable::Float(left / right))
            }
            (Variable::Vector(left), Variable::Float(right)) => {
                if *right == 0.0 {
                    return Err(ScriptError::DivisionByZero);
                }
                Ok(Variable::Vector(*left / *right))
            }
            (Variable::Float(left), Variable::Vector(right)) => {
                if right.x == 0.0 || right.y == 0.0 || right.z == 0.0 {
                    return Err(ScriptError::DivisionByZero);
                }
                Ok(Variable::Vector(Vector::new(
                    left / right.x,
                    left / right.y,
                    left / right.z,
                )))
            }
            _ => Err(Self::unsupported("div", self, other)),
        }
    }

    /// Ordering for int, float, and string values; other tags have no order.
    pub fn compare(&self, other: &Variable) -> Result<Ordering, ScriptError> {
        match (self, other) {
            (Variable::Int(left), Variable::Int(right)) => Ok(left.cmp(right)),
            (Variable::Float(left), Variable::Float(right)) => {
                Ok(left.partial_cmp(right).unwrap_or(Ordering::Equal))
            }
            (Variable::String(left), Variable::String(right)) => Ok(left.cmp(right)),
            _ => Err(Self::unsupported("compare", self, other)),
        }
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Variable::Void, Variable::Void) => true,
            (Variable::Int(left), Variable::Int(right)) => left == right,
            (Variable::Float(left), Variable::Float(right)) => left == right,
            (Variable::String(left), Variable::String(right)) => left == right,
            (Variable::Vector(left), Variable::Vector(right)) => left == right,
            (Variable::Object(left), Variable::Object(right)) => left == right,
            (Variable::Effect(left), Variable::Effect(right)) => handles_equal(left, right),
            (Variable::Event(left), Variable::Event(right)) => handles_equal(left, right),
            (Variable::Location(left), Variable::Location(right)) => handles_equal(left, right),
            (Variable::Talent(left), Variable::Talent(right)) => handles_equal(left, right),
            _ => false,
        }
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Void => write!(f, "void"),
            Variable::Int(value) => write!(f, "{}", value),
            Variable::Float(value) => write!(f, "{}", value),
            Variable::String(value) => write!(f, "\"{}\"", value),
            Variable::Vector(value) => write!(f, "[{},{},{}]", value.x, value.y, value.z),
            Variable::Object(id) => write!(f, "{}", id),
            Variable::Effect(_) => write!(f, "effect"),
            Variable::Event(_) => write!(f, "event"),
            Variable::Location(_) => write!(f, "location"),
            Variable::Talent(_) => write!(f, "talent"),
            Variable::Action(_) => write!(f, "action"),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Engine-type stand-in for handle tests.
    #[derive(Debug)]
    pub struct TestEngineType;

    impl EngineType for TestEngineType {}

    pub fn handle() -> EngineHandle {
        Some(Arc::new(TestEngineType))
    }

    // ==================== Arithmetic ====================

    #[test]
    fn add_int_pairs() {
        let result = Variable::Int(40).add(&Variable::Int(2)).unwrap();
        assert_eq!(result, Variable::Int(42));
    }

    #[test]
    fn add_wraps() {
        let result = Variable::Int(i32::MAX).add(&Variable::Int(1)).unwrap();
        assert_eq!(result, Variable::Int(i32::MIN));
    }

    #[test]
    fn add_promotes_mixed_numeric() {
        assert_eq!(
            Variable::Int(1).add(&Variable::Float(2.5)).unwrap(),
            Variable::Float(3.5)
        );
        assert_eq!(
            Variable::Float(2.5).add(&Variable::Int(1)).unwrap(),
            Variable::Float(3.5)
        );
        assert_eq!(
            Variable::Float(1.5).add(&Variable::Float(2.0)).unwrap(),
            Variable::Float(3.5)
        );
    }

    #[test]
    fn add_concatenates_strings() {
        let result = Variable::String("foo".to_string())
            .add(&Variable::String("bar".to_string()))
            .unwrap();
        assert_eq!(result, Variable::String("foobar".to_string()));
    }

    #[test]
    fn add_vectors() {
        let result = Variable::Vector(Vector::new(1.0, 2.0, 3.0))
            .add(&Variable::Vector(Vector::new(4.0, 5.0, 6.0)))
            .unwrap();
        assert_eq!(result, Variable::Vector(Vector::new(5.0, 7.0, 9.0)));
    }

    #[test]
    fn add_rejects_unsupported_pair() {
        let err = Variable::String("x".to_string())
            .add(&Variable::Int(1))
            .unwrap_err();
        assert!(matches!(
            err,
            ScriptError::UnsupportedTypes {
                operation: "add",
                left: VariableType::String,
                right: VariableType::Int,
            }
        ));
    }

    #[test]
    fn sub_pairs() {
        assert_eq!(
            Variable::Int(50).sub(&Variable::Int(8)).unwrap(),
            Variable::Int(42)
        );
        assert_eq!(
            Variable::Int(5).sub(&Variable::Float(1.5)).unwrap(),
            Variable::Float(3.5)
        );
        assert_eq!(
            Variable::Vector(Vector::new(5.0, 7.0, 9.0))
                .sub(&Variable::Vector(Vector::new(4.0, 5.0, 6.0)))
                .unwrap(),
            Variable::Vector(Vector::new(1.0, 2.0, 3.0))
        );
        assert!(Variable::String("a".to_string())
            .sub(&Variable::String("b".to_string()))
            .is_err());
    }

    #[test]
    fn mul_scales_vectors() {
        assert_eq!(
            Variable::Vector(Vector::new(1.0, 2.0, 3.0))
                .mul(&Variable::Float(2.0))
                .unwrap(),
            Variable::Vector(Vector::new(2.0, 4.0, 6.0))
        );
        assert_eq!(
            Variable::Float(2.0)
                .mul(&Variable::Vector(Vector::new(1.0, 2.0, 3.0)))
                .unwrap(),
            Variable::Vector(Vector::new(2.0, 4.0, 6.0))
        );
    }

    #[test]
    fn div_pairs() {
        assert_eq!(
            Variable::Int(84).div(&Variable::Int(2)).unwrap(),
            Variable::Int(42)
        );
        assert_eq!(
            Variable::Vector(Vector::new(2.0, 4.0, 6.0))
                .div(&Variable::Float(2.0))
                .unwrap(),
            Variable::Vector(Vector::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn div_by_zero_is_fatal() {
        assert!(matches!(
            Variable::Int(1).div(&Variable::Int(0)),
            Err(ScriptError::DivisionByZero)
        ));
        assert!(matches!(
            Variable::Float(1.0).div(&Variable::Float(0.0)),
            Err(ScriptError::DivisionByZero)
        ));
        assert!(matches!(
            Variable::Vector(Vector::ZERO).div(&Variable::Float(0.0)),
            Err(ScriptError::DivisionByZero)
        ));
    }

    // ==================== Comparison ====================

    #[test]
    fn compare_ints_floats_strings() {
        assert_eq!(
            Variable::Int(1).compare(&Variable::Int(2)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            Variable::Float(2.0).compare(&Variable::Float(1.0)).unwrap(),
            Ordering::Greater
        );
        assert_eq!(
            Variable::String("a".to_string())
                .compare(&Variable::String("a".to_string()))
                .unwrap(),
            Ordering::Equal
        );
    }

    #[test]
    fn compare_rejects_objects() {
        assert!(Variable::Object(1).compare(&Variable::Object(2)).is_err());
    }

    // ==================== Equality ====================

    #[test]
    fn equality_mismatched_tags() {
        assert_ne!(Variable::Int(1), Variable::Float(1.0));
    }

    #[test]
    fn equality_engine_handles_by_identity() {
        let shared = handle();
        assert_eq!(
            Variable::Effect(shared.clone()),
            Variable::Effect(shared.clone())
        );
        assert_ne!(Variable::Effect(shared), Variable::Effect(handle()));
        assert_eq!(Variable::Effect(None), Variable::Effect(None));
    }

    #[test]
    fn equality_across_engine_kinds() {
        let shared = handle();
        assert_ne!(Variable::Effect(shared.clone()), Variable::Event(shared));
    }

    // ==================== Defaults ====================

    #[test]
    fn default_values() {
        assert_eq!(Variable::default_for(VariableType::Int), Variable::Int(0));
        assert_eq!(
            Variable::default_for(VariableType::String),
            Variable::String(String::new())
        );
        assert_eq!(
            Variable::default_for(VariableType::Object),
            Variable::Object(OBJECT_INVALID)
        );
        assert_eq!(
            Variable::default_for(VariableType::Vector),
            Variable::Vector(Vector::ZERO)
        );
        assert_eq!(
            Variable::default_for(VariableType::Talent),
            Variable::Talent(None)
        );
    }
}
