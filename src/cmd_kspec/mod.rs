pub mod calls;
pub mod predict;
pub mod train;
pub mod window;
