//! Bakes WiFi credentials and the time zone into the firmware.
//!
//! Values come from the process environment or a `.env` file next to the
//! workspace root, e.g.
//!
//! ```text
//! HEARTH_WIFI_SSID=home
//! HEARTH_WIFI_PASSWORD=secret
//! HEARTH_TIME_ZONE=EST5EDT,M3.2.0,M11.1.0
//! ```

const KEYS: [&str; 3] = ["HEARTH_WIFI_SSID", "HEARTH_WIFI_PASSWORD", "HEARTH_TIME_ZONE"];

fn main() {
    println!("cargo:rustc-link-arg=-Tlinkall.x");

    match dotenvy::dotenv() {
        Ok(path) => println!("cargo:rerun-if-changed={}", path.display()),
        Err(err) if err.not_found() => {
            println!("cargo:warning=No .env file found, using environment only")
        }
        Err(err) => println!("cargo:warning=Could not read .env: {err}"),
    }

    for key in KEYS {
        println!("cargo:rerun-if-env-changed={key}");
        // Missing values become empty strings; the firmware logs and keeps
        // the defaults instead of failing the build.
        let value = std::env::var(key).unwrap_or_default();
        println!("cargo:rustc-env={key}={value}");
    }
}
