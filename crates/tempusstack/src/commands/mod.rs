pub mod down;
pub mod logs;
pub mod restart;
pub mod status;
pub mod up;
pub mod validate;
