use std::env::var;

// Made visible to the crate for the startup banner.
const FORWARDED_ENV: [&str; 2] = ["CARGO_CFG_TARGET_ARCH", "CARGO_CFG_TARGET_OS"];

fn main() {
    for env in FORWARDED_ENV {
        if let Ok(value) = var(env) {
            println!("cargo:rustc-env={}={}", env, value);
        }
    }
}
