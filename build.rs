/// Frost build script.
///
/// The blur logic is portable so its tests run anywhere, but the binary only
/// does something useful on Windows. Say so at build time instead of leaving
/// the user to discover it at run time.
fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" {
        println!(
            "cargo:warning=frost targets Windows; the {target_os} build only \
             exits with an error"
        );
    }

    println!("cargo:rerun-if-changed=build.rs");
}
