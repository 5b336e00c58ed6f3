use super::ValueKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("expected two number operands but got {0} and {1}")]
    NonNumericOperands(ValueKind, ValueKind),
    #[error("expected two boolean operands but got {0} and {1}")]
    NonBooleanOperands(ValueKind, ValueKind),
    #[error("expected a boolean operand but got {0}")]
    NonBooleanOperand(ValueKind),
}
