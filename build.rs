/// Ledge build script.
///
/// The bar itself only runs on Windows. Other targets still build the
/// platform-neutral dock core so its tests can run anywhere; warn about it
/// instead of silently producing a binary that exits at startup.
fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" {
        println!(
            "cargo:warning=Ledge only runs on Windows \
             (CARGO_CFG_TARGET_OS = {target_os:?}); building the headless dock core"
        );
    }

    // Only re-run the build script when it changes.
    println!("cargo:rerun-if-changed=build.rs");
}
