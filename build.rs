//! Build metadata for `asdb version`: build timestamp plus the cargo
//! target triple, opt level and debug flag.

use vergen::{BuildBuilder, CargoBuilder, Emitter};

fn main() {
    let mut emitter = Emitter::default();

    match BuildBuilder::all_build() {
        Ok(build) => {
            let _ = emitter.add_instructions(&build);
        }
        Err(e) => println!("cargo:warning=no build timestamp: {e}"),
    }
    match CargoBuilder::all_cargo() {
        Ok(cargo) => {
            let _ = emitter.add_instructions(&cargo);
        }
        Err(e) => println!("cargo:warning=no cargo metadata: {e}"),
    }

    if let Err(e) = emitter.emit() {
        println!("cargo:warning=version metadata not embedded: {e}");
    }
}
