// Build script for sid2wav
//
// With the `libsidplayfp` feature, compiles the C ABI shim in csrc/ and links
// libsidplayfp. Set SIDPLAYFP_INCLUDE_DIR and SIDPLAYFP_LIB_DIR when the
// library is not installed on the default search paths.

fn main() {
    println!("cargo:rerun-if-env-changed=SIDPLAYFP_INCLUDE_DIR");
    println!("cargo:rerun-if-env-changed=SIDPLAYFP_LIB_DIR");

    #[cfg(feature = "libsidplayfp")]
    shim::build();
}

#[cfg(feature = "libsidplayfp")]
mod shim {
    use std::env;
    use std::path::Path;

    const SHIM_SOURCE: &str = "csrc/sidplayer_shim.cpp";

    pub fn build() {
        println!("cargo:rerun-if-changed={SHIM_SOURCE}");

        let mut build = cc::Build::new();
        build.cpp(true).std("c++14").file(SHIM_SOURCE).warnings(false);
        if let Some(dir) = env::var_os("SIDPLAYFP_INCLUDE_DIR") {
            build.include(Path::new(&dir));
        }
        // cc links the static shim and the C++ runtime
        build.compile("sidplayer_shim");

        if let Some(dir) = env::var_os("SIDPLAYFP_LIB_DIR") {
            println!(
                "cargo:rustc-link-search=native={}",
                Path::new(&dir).display()
            );
        }
        println!("cargo:rustc-link-lib=sidplayfp");
    }
}
