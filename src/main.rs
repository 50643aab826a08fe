//! Minimal operator CLI for the crypto utilities. Commands are intentionally
//! small and auditable so operators can see exactly how secrets are handled.

use std::env;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use serde_json::json;
use taskforge_crypto::config::load_keyring;
use taskforge_crypto::crypto::integrity::{sha256_hex, HmacSigner};
use taskforge_crypto::crypto::passwords::{hash_password, verify_password};
use taskforge_crypto::crypto::secrets::{EncryptedSecret, SecretVault};
use taskforge_crypto::crypto::tokens::generate_token;

fn print_usage() {
    eprintln!("Commands:\n  hash-password <plaintext>\n  verify-password <plaintext> <argon2-hash>\n  encrypt-secret <env_var_with_base64_key> <plaintext>\n  decrypt-secret <env_var_with_base64_key> <json-envelope>\n  generate-token <length>\n  sign-payload <env_var_with_base64_key> <data>\n  digest <data>\n  load-keyring <path>");
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "hash-password" => {
            if args.len() != 3 {
                return print_usage();
            }
            match hash_password(&args[2]) {
                Ok(hash) => println!("{hash}"),
                Err(err) => eprintln!("hashing failed: {err}"),
            }
        }
        "verify-password" => {
            if args.len() != 4 {
                return print_usage();
            }
            match verify_password(&args[2], &args[3]) {
                Ok(matches) => println!("{}", if matches { "match" } else { "no-match" }),
                Err(err) => eprintln!("verification failed: {err}"),
            }
        }
        "encrypt-secret" => {
            if args.len() != 4 {
                return print_usage();
            }
            let vault = match SecretVault::from_env_var(&args[2]) {
                Ok(v) => v,
                Err(e) => return eprintln!("vault setup failed: {e}"),
            };
            match vault.encrypt_secret(args[3].as_bytes()) {
                Ok(secret) => println!("{}", serde_json::to_string_pretty(&secret).unwrap()),
                Err(err) => eprintln!("encryption failed: {err}"),
            }
        }
        "decrypt-secret" => {
            if args.len() != 4 {
                return print_usage();
            }
            let vault = match SecretVault::from_env_var(&args[2]) {
                Ok(v) => v,
                Err(e) => return eprintln!("vault setup failed: {e}"),
            };
            let envelope: EncryptedSecret = match serde_json::from_str(&args[3]) {
                Ok(env) => env,
                Err(err) => return eprintln!("invalid envelope json: {err}"),
            };
            match vault.decrypt_secret(&envelope) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => println!("{text}"),
                    Err(err) => eprintln!("decryption succeeded but UTF-8 failed: {err}"),
                },
                Err(err) => eprintln!("decryption failed: {err}"),
            }
        }
        "generate-token" => {
            if args.len() != 3 {
                return print_usage();
            }
            let length: usize = match args[2].parse() {
                Ok(n) => n,
                Err(err) => return eprintln!("invalid length: {err}"),
            };
            match generate_token(length) {
                Ok(token) => println!("{token}"),
                Err(err) => eprintln!("token generation failed: {err}"),
            }
        }
        "sign-payload" => {
            if args.len() != 4 {
                return print_usage();
            }
            let key = match env::var(&args[2]) {
                Ok(encoded) => match STANDARD_NO_PAD.decode(encoded.as_bytes()) {
                    Ok(bytes) => bytes,
                    Err(err) => return eprintln!("key decoding failed: {err}"),
                },
                Err(err) => return eprintln!("key source unreadable: {err}"),
            };
            let signer = match HmacSigner::from_key_bytes(&key) {
                Ok(s) => s,
                Err(e) => return eprintln!("signer setup failed: {e}"),
            };
            match signer.sign(args[3].as_bytes()) {
                Ok(digest) => println!("{digest}"),
                Err(err) => eprintln!("signing failed: {err}"),
            }
        }
        "digest" => {
            if args.len() != 3 {
                return print_usage();
            }
            println!("{}", sha256_hex(args[2].as_bytes()));
        }
        "load-keyring" => {
            if args.len() != 3 {
                return print_usage();
            }
            match load_keyring(Path::new(&args[2])) {
                Ok(_keyring) => {
                    let printable = json!({
                        "vault": "ready",
                        "signer": "ready",
                        "masterKey": "<redacted in output>"
                    });
                    println!("{}", serde_json::to_string_pretty(&printable).unwrap());
                }
                Err(err) => eprintln!("keyring load failed: {err}"),
            }
        }
        _ => print_usage(),
    }
}
