pub mod conversations;
pub mod stream;
