//! Prints an Argon2 PHC hash for use as ADMIN_PASSWORD_HASH.
//!
//! Usage: `hash_password <password>` or pipe the password on stdin.

use std::io::{self, BufRead};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let password = match std::env::args().nth(1) {
        Some(password) => password,
        None => {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        return Err("password must not be empty".into());
    }

    println!("{}", shared::hash_password(&password)?);
    Ok(())
}
