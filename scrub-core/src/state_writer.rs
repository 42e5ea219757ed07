//! External full-checkpoint operation, invoked synchronously by the
//! autosave controller.

pub trait StateWriter {
    fn write(&mut self) -> std::io::Result<()>;
}
