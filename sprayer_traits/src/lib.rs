/// Destination for a compiled program's text.
///
/// Implementations persist it, queue it for a controller, or stream it
/// directly. `name` identifies the program (e.g. a file name).
pub trait ProgramSink {
    fn submit(
        &mut self,
        name: &str,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
