/// Delegates to nih_plug_xtask for bundling:
///
///   cargo xtask bundle learn-delay --release
///
/// The bundles land in `target/bundled/`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
