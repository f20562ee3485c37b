use std::env;
use std::path::PathBuf;

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let include_dir = PathBuf::from(&crate_dir).join("include");
    let output_file = include_dir.join("pulse_dsp.h");

    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    if let Err(e) = std::fs::create_dir_all(&include_dir) {
        println!("cargo:warning=could not create {}: {}", include_dir.display(), e);
        return;
    }

    let config = match cbindgen::Config::from_file(PathBuf::from(&crate_dir).join("cbindgen.toml"))
    {
        Ok(c) => c,
        Err(e) => {
            println!("cargo:warning=invalid cbindgen.toml: {}", e);
            return;
        }
    };

    // Header failures are reported as warnings only
    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(&output_file);
        }
        Err(e) => println!("cargo:warning=C header not generated: {}", e),
    }
}
