pub mod singular_value;
pub mod tensor_multiply;
