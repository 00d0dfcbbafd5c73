/// How a run of the build tool behaves, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Build every bundle once, minified, then exit.
    Batch,
    /// Build every bundle unminified and rebuild on each change until killed.
    Watch,
}

impl Mode {
    pub const WATCH_FLAG: &'static str = "--watch";

    /// Picks the mode from the process arguments (without the program name).
    ///
    /// Only `--watch` is recognized. Anything else is ignored on purpose, there is no help text and no
    /// error for unknown arguments.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if args.into_iter().any(|arg| arg.as_ref() == Self::WATCH_FLAG) {
            Mode::Watch
        } else {
            Mode::Batch
        }
    }

    pub fn minify(self) -> bool {
        match self {
            Mode::Batch => true,
            Mode::Watch => false,
        }
    }
}
