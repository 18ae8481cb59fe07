//! End-to-end scenarios: seal, unseal, reseal, and info against real
//! folders on disk.

use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tempfile::TempDir;

use tvault_core::error::codes;
use tvault_core::io::{Format, SinkTarget, Source, SourceTarget};
use tvault_core::{ErrorKind, IntegrityType, TokenType};
use tvault_ops::options::TokenSink;
use tvault_ops::{inspect, reseal, seal, unseal, ResealOptions, SealOptions, UnsealOptions};

fn build_folder(root: &Path) {
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("a.txt"), b"hello").unwrap();
    fs::write(root.join("sub/b.txt"), b"world").unwrap();
}

fn assert_folder_restored(root: &Path) {
    assert_eq!(fs::read(root.join("a.txt")).unwrap(), b"hello");
    assert_eq!(fs::read(root.join("sub/b.txt")).unwrap(), b"world");
}

fn file_sink(dir: &Path, name: &str) -> TokenSink {
    TokenSink {
        target: SinkTarget::File(dir.join(name)),
        format: Format::Json,
    }
}

fn seal_options(tmp: &TempDir, token_type: TokenType) -> SealOptions {
    let folder = tmp.path().join("input");
    build_folder(&folder);

    SealOptions {
        folder_path: Some(folder),
        new_path: Some(tmp.path().join("vault.tvlt")),
        passphrase: Some(SecretString::from("p1")),
        token_type,
        integrity_type: IntegrityType::Hmac,
        integrity_passphrase: Some(SecretString::from("ipw")),
        token_sink: file_sink(tmp.path(), "tokens.json"),
        ..SealOptions::default()
    }
}

fn flag_source(tokens: &[String]) -> Source {
    let json = serde_json::json!({ "token_list": tokens }).to_string();
    Source::new(SourceTarget::Flag(json), Format::Json)
}

// ── scenario 1: seal then unseal, token = none ──────────────────────────

#[test]
fn seal_unseal_with_passphrase_only() {
    let tmp = TempDir::new().unwrap();
    let mut opts = seal_options(&tmp, TokenType::None);
    opts.integrity_type = IntegrityType::None;
    opts.integrity_passphrase = None;

    let tokens = seal(&opts).unwrap();
    assert!(tokens.token_list.is_empty());

    let container_path = tmp.path().join("vault.tvlt");
    let bytes = fs::read(&container_path).unwrap();
    assert_eq!(&bytes[0..5], b"TVLT\x01");

    let out = tmp.path().join("restored");
    unseal(&UnsealOptions {
        current_path: Some(container_path),
        folder_path: Some(out.clone()),
        passphrase: Some(SecretString::from("p1")),
        integrity_passphrase: None,
        token_source: None,
    })
    .unwrap();

    assert_folder_restored(&out);
}

#[test]
fn unseal_with_wrong_passphrase_is_auth_failure() {
    let tmp = TempDir::new().unwrap();
    let mut opts = seal_options(&tmp, TokenType::None);
    opts.integrity_type = IntegrityType::None;
    opts.integrity_passphrase = None;
    seal(&opts).unwrap();

    let err = unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(tmp.path().join("restored")),
        passphrase: Some(SecretString::from("wrong")),
        integrity_passphrase: None,
        token_source: None,
    })
    .unwrap_err();

    assert_eq!(err.code, codes::AUTHENTICATION_FAILED);
    assert_eq!(err.kind, ErrorKind::Crypto);
}

// ── scenario 2: share tokens, n = 5, t = 3, hmac integrity ──────────────

#[test]
fn share_tokens_any_threshold_subset_unseals() {
    let tmp = TempDir::new().unwrap();
    let tokens = seal(&seal_options(&tmp, TokenType::Share)).unwrap();
    assert_eq!(tokens.token_list.len(), 5);

    for (n, subset) in [
        vec![0usize, 1, 2],
        vec![0, 2, 4],
        vec![1, 3, 4],
        vec![0, 1, 2, 3, 4],
    ]
    .into_iter()
    .enumerate()
    {
        let picked: Vec<String> = subset.iter().map(|&i| tokens.token_list[i].clone()).collect();
        let out = tmp.path().join(format!("restored-{n}"));
        unseal(&UnsealOptions {
            current_path: Some(tmp.path().join("vault.tvlt")),
            folder_path: Some(out.clone()),
            passphrase: None,
            integrity_passphrase: Some(SecretString::from("ipw")),
            token_source: Some(flag_source(&picked)),
        })
        .unwrap();
        assert_folder_restored(&out);
    }
}

#[test]
fn share_tokens_below_threshold_fail() {
    let tmp = TempDir::new().unwrap();
    let tokens = seal(&seal_options(&tmp, TokenType::Share)).unwrap();

    let err = unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(tmp.path().join("restored")),
        passphrase: None,
        integrity_passphrase: Some(SecretString::from("ipw")),
        token_source: Some(flag_source(&tokens.token_list[..2].to_vec())),
    })
    .unwrap_err();

    // two honest shares verify but interpolate to the wrong key, so the
    // failure surfaces at the GCM tag
    assert_eq!(err.code, codes::AUTHENTICATION_FAILED);
}

#[test]
fn share_tokens_single_share_rejected() {
    let tmp = TempDir::new().unwrap();
    let tokens = seal(&seal_options(&tmp, TokenType::Share)).unwrap();

    let err = unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(tmp.path().join("restored")),
        passphrase: None,
        integrity_passphrase: Some(SecretString::from("ipw")),
        token_source: Some(flag_source(&tokens.token_list[..1].to_vec())),
    })
    .unwrap_err();

    assert_eq!(err.code, codes::SHAMIR_NEED_SHARES);
    assert!(err.message.contains("need at least 2 shares"));
}

#[test]
fn share_tokens_wrong_integrity_passphrase_fails_at_parse() {
    let tmp = TempDir::new().unwrap();
    let tokens = seal(&seal_options(&tmp, TokenType::Share)).unwrap();

    let err = unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(tmp.path().join("restored")),
        passphrase: None,
        integrity_passphrase: Some(SecretString::from("not-ipw")),
        token_source: Some(flag_source(&tokens.token_list[..3].to_vec())),
    })
    .unwrap_err();

    // wrong k_tok turns the token JSON into garbage
    assert_eq!(err.kind, ErrorKind::Format);
}

#[test]
fn share_token_corrupted_ciphertext_fails_at_parse() {
    let tmp = TempDir::new().unwrap();
    let tokens = seal(&seal_options(&tmp, TokenType::Share)).unwrap();

    // flip one base64 char of one encrypted token
    let mut tampered = tokens.token_list[..3].to_vec();
    let mut chars: Vec<char> = tampered[0].chars().collect();
    let mid = chars.len() / 2;
    chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
    tampered[0] = chars.into_iter().collect();

    let err = unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(tmp.path().join("restored")),
        passphrase: None,
        integrity_passphrase: Some(SecretString::from("ipw")),
        token_source: Some(flag_source(&tampered)),
    })
    .unwrap_err();

    // corrupted ciphertext decrypts to garbage JSON
    assert_eq!(err.kind, ErrorKind::Format);
}

#[test]
fn share_token_tampered_value_is_rejected_by_signature() {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use tvault_crypto::{derive_key, token};

    let tmp = TempDir::new().unwrap();
    let tokens = seal(&seal_options(&tmp, TokenType::Share)).unwrap();

    // re-derive the token-encryption key the way unseal does, then forge
    // a share with one flipped value byte and a re-encrypted payload
    let bytes = fs::read(tmp.path().join("vault.tvlt")).unwrap();
    let k_tok = derive_key(
        &SecretString::from("ipw"),
        &bytes[6..22],
        tvault_core::ITERATIONS,
    );

    let mut forged = token::parse(&tokens.token_list[0], Some(k_tok.as_bytes())).unwrap();
    let mut value = hex::decode(&forged.value).unwrap();
    value[0] ^= 0xFF;
    forged.value = hex::encode(&value);
    let reencoded = STANDARD.encode(token::build(&forged, Some(k_tok.as_bytes())).unwrap());

    let tampered = vec![
        reencoded,
        tokens.token_list[1].clone(),
        tokens.token_list[2].clone(),
    ];

    let err = unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(tmp.path().join("restored")),
        passphrase: None,
        integrity_passphrase: Some(SecretString::from("ipw")),
        token_source: Some(flag_source(&tampered)),
    })
    .unwrap_err();

    assert_eq!(err.code, codes::SHAMIR_SIGNATURE_VERIFY);
    assert!(err.message.contains("verify share signature failed"));
}

// ── scenario 3: master token ────────────────────────────────────────────

#[test]
fn master_token_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let tokens = seal(&seal_options(&tmp, TokenType::Master)).unwrap();
    assert_eq!(tokens.token_list.len(), 1);

    let out = tmp.path().join("restored");
    unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(out.clone()),
        passphrase: None,
        integrity_passphrase: Some(SecretString::from("ipw")),
        token_source: Some(flag_source(&tokens.token_list)),
    })
    .unwrap();
    assert_folder_restored(&out);
}

#[test]
fn master_token_invalid_base64_is_format_error() {
    let tmp = TempDir::new().unwrap();
    let tokens = seal(&seal_options(&tmp, TokenType::Master)).unwrap();

    let mut corrupted = tokens.token_list.clone();
    corrupted[0].replace_range(4..5, "!");

    let err = unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(tmp.path().join("restored")),
        passphrase: None,
        integrity_passphrase: Some(SecretString::from("ipw")),
        token_source: Some(flag_source(&corrupted)),
    })
    .unwrap_err();

    assert_eq!(err.code, codes::TOKEN_BASE64);
    assert_eq!(err.kind, ErrorKind::Format);
}

#[test]
fn master_token_corrupted_key_hex_is_auth_failure() {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    let tmp = TempDir::new().unwrap();
    // plain (unencrypted) token so the hex payload is editable: none
    // provider, no integrity passphrase
    let mut opts = seal_options(&tmp, TokenType::Master);
    opts.integrity_type = IntegrityType::None;
    opts.integrity_passphrase = None;
    let tokens = seal(&opts).unwrap();

    let raw = STANDARD.decode(&tokens.token_list[0]).unwrap();
    let mut token_json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    // flip one hex digit of the embedded key, keeping it valid hex
    let vl = token_json["vl"].as_str().unwrap();
    let replacement = if vl.starts_with('0') { "1" } else { "0" };
    let corrupted_vl = format!("{replacement}{}", &vl[1..]);
    token_json["vl"] = serde_json::Value::String(corrupted_vl);
    let corrupted = STANDARD.encode(serde_json::to_vec(&token_json).unwrap());

    let err = unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(tmp.path().join("restored")),
        passphrase: None,
        integrity_passphrase: None,
        token_source: Some(flag_source(&[corrupted])),
    })
    .unwrap_err();

    assert_eq!(err.code, codes::AUTHENTICATION_FAILED);
}

// ── scenario 4: reseal re-keys the tokens but not the data ──────────────

#[test]
fn reseal_keeps_salt_and_key_but_refreshes_nonce_and_tokens() {
    let tmp = TempDir::new().unwrap();
    let tokens = seal(&seal_options(&tmp, TokenType::Share)).unwrap();
    let container_path = tmp.path().join("vault.tvlt");

    let before = fs::read(&container_path).unwrap();
    let salt_before = before[6..22].to_vec();
    let nonce_before = before[29..41].to_vec();

    let new_tokens = reseal(&ResealOptions {
        current_path: Some(container_path.clone()),
        new_path: None,
        folder_path: Some(tmp.path().join("input")),
        passphrase: None,
        name: None,
        comment: None,
        tags: None,
        integrity_current_passphrase: Some(SecretString::from("ipw")),
        integrity_new_passphrase: Some(SecretString::from("ipw2")),
        token_source: Some(flag_source(&tokens.token_list)),
        token_sink: file_sink(tmp.path(), "tokens2.json"),
    })
    .unwrap();
    assert_eq!(new_tokens.token_list.len(), 5);

    let after = fs::read(&container_path).unwrap();
    assert_eq!(after[6..22], salt_before[..], "salt must survive reseal");
    assert_ne!(after[29..41], nonce_before[..], "nonce must be fresh");
    assert_ne!(before, after, "ciphertext must differ");

    // the reissued tokens (under the new integrity passphrase) still
    // recover the same data-encryption-key
    let out = tmp.path().join("restored");
    unseal(&UnsealOptions {
        current_path: Some(container_path),
        folder_path: Some(out.clone()),
        passphrase: None,
        integrity_passphrase: Some(SecretString::from("ipw2")),
        token_source: Some(flag_source(&new_tokens.token_list[1..4].to_vec())),
    })
    .unwrap();
    assert_folder_restored(&out);
}

#[test]
fn reseal_picks_up_new_folder_content() {
    let tmp = TempDir::new().unwrap();
    let mut opts = seal_options(&tmp, TokenType::None);
    opts.integrity_type = IntegrityType::None;
    opts.integrity_passphrase = None;
    seal(&opts).unwrap();

    // mutate the folder, then reseal it
    fs::write(tmp.path().join("input/a.txt"), b"changed").unwrap();

    reseal(&ResealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        new_path: None,
        folder_path: Some(tmp.path().join("input")),
        passphrase: Some(SecretString::from("p1")),
        name: None,
        comment: None,
        tags: None,
        integrity_current_passphrase: None,
        integrity_new_passphrase: None,
        token_source: None,
        token_sink: file_sink(tmp.path(), "tokens2.json"),
    })
    .unwrap();

    let out = tmp.path().join("restored");
    unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(out.clone()),
        passphrase: Some(SecretString::from("p1")),
        integrity_passphrase: None,
        token_source: None,
    })
    .unwrap();
    assert_eq!(fs::read(out.join("a.txt")).unwrap(), b"changed");
}

#[test]
fn reseal_to_new_path_leaves_original_untouched() {
    let tmp = TempDir::new().unwrap();
    let mut opts = seal_options(&tmp, TokenType::None);
    opts.integrity_type = IntegrityType::None;
    opts.integrity_passphrase = None;
    seal(&opts).unwrap();

    let original = fs::read(tmp.path().join("vault.tvlt")).unwrap();
    let new_path = tmp.path().join("vault2.tvlt");

    reseal(&ResealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        new_path: Some(new_path.clone()),
        folder_path: Some(tmp.path().join("input")),
        passphrase: Some(SecretString::from("p1")),
        name: None,
        comment: None,
        tags: None,
        integrity_current_passphrase: None,
        integrity_new_passphrase: None,
        token_source: None,
        token_sink: file_sink(tmp.path(), "tokens2.json"),
    })
    .unwrap();

    assert!(new_path.exists());
    assert_eq!(fs::read(tmp.path().join("vault.tvlt")).unwrap(), original);
}

// ── scenario 5: reseal bumps updated_at, preserves created_at ───────────

#[test]
fn reseal_updates_metadata_timestamps_and_overrides() {
    let tmp = TempDir::new().unwrap();
    let mut opts = seal_options(&tmp, TokenType::None);
    opts.integrity_type = IntegrityType::None;
    opts.integrity_passphrase = None;
    seal(&opts).unwrap();

    let container_path = tmp.path().join("vault.tvlt");
    let before = inspect(&container_path).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(10));

    reseal(&ResealOptions {
        current_path: Some(container_path.clone()),
        new_path: None,
        folder_path: Some(tmp.path().join("input")),
        passphrase: Some(SecretString::from("p1")),
        name: Some("renamed".into()),
        comment: Some("resealed".into()),
        tags: Some(vec!["prod".into(), "weekly".into()]),
        integrity_current_passphrase: None,
        integrity_new_passphrase: None,
        token_source: None,
        token_sink: file_sink(tmp.path(), "tokens2.json"),
    })
    .unwrap();

    let after = inspect(&container_path).unwrap();
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
    assert_eq!(after.name, "renamed");
    assert_eq!(after.comment, "resealed");
    assert_eq!(after.tags, vec!["prod".to_string(), "weekly".to_string()]);
}

// ── scenario 6: info needs no key ───────────────────────────────────────

#[test]
fn info_reports_header_fields_without_any_key() {
    let tmp = TempDir::new().unwrap();
    seal(&seal_options(&tmp, TokenType::Share)).unwrap();

    let info = inspect(&tmp.path().join("vault.tvlt")).unwrap();
    assert_eq!(info.name, "vault");
    assert_eq!(info.version, 1);
    assert_eq!(info.token_type, "share");
    assert_eq!(info.integrity_provider_type, "hmac");
    assert_eq!(info.compression_type, "zip");
    assert_eq!(info.shares, 5);
    assert_eq!(info.threshold, 3);
    assert_eq!(info.comment, "created by trust vault core");
}

#[test]
fn info_rejects_bad_signature() {
    let tmp = TempDir::new().unwrap();
    let mut opts = seal_options(&tmp, TokenType::None);
    opts.integrity_type = IntegrityType::None;
    opts.integrity_passphrase = None;
    seal(&opts).unwrap();

    let path = tmp.path().join("vault.tvlt");
    let mut bytes = fs::read(&path).unwrap();
    bytes[0] = b'X';
    fs::write(&path, &bytes).unwrap();

    let err = inspect(&path).unwrap_err();
    assert_eq!(err.code, codes::INVALID_SIGNATURE);
    assert_eq!(err.kind, ErrorKind::Format);
}

// ── tampering with the container body ───────────────────────────────────

#[test]
fn flipped_ciphertext_byte_fails_authentication() {
    let tmp = TempDir::new().unwrap();
    let mut opts = seal_options(&tmp, TokenType::None);
    opts.integrity_type = IntegrityType::None;
    opts.integrity_passphrase = None;
    seal(&opts).unwrap();

    let path = tmp.path().join("vault.tvlt");
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    fs::write(&path, &bytes).unwrap();

    let err = unseal(&UnsealOptions {
        current_path: Some(path),
        folder_path: Some(tmp.path().join("restored")),
        passphrase: Some(SecretString::from("p1")),
        integrity_passphrase: None,
        token_source: None,
    })
    .unwrap_err();

    assert_eq!(err.code, codes::AUTHENTICATION_FAILED);
}

// ── token wire formats ──────────────────────────────────────────────────

#[test]
fn tokens_roundtrip_through_plaintext_file() {
    let tmp = TempDir::new().unwrap();
    let mut opts = seal_options(&tmp, TokenType::Share);
    opts.token_sink = TokenSink {
        target: SinkTarget::File(tmp.path().join("tokens.txt")),
        format: Format::Plaintext,
    };
    seal(&opts).unwrap();

    let text = fs::read_to_string(tmp.path().join("tokens.txt")).unwrap();
    assert_eq!(text.trim().split('|').count(), 5);

    let out = tmp.path().join("restored");
    unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(out.clone()),
        passphrase: None,
        integrity_passphrase: Some(SecretString::from("ipw")),
        token_source: Some(Source::new(
            SourceTarget::File(tmp.path().join("tokens.txt")),
            Format::Plaintext,
        )),
    })
    .unwrap();
    assert_folder_restored(&out);
}

#[test]
fn token_writer_json_file_matches_returned_list() {
    let tmp = TempDir::new().unwrap();
    let tokens = seal(&seal_options(&tmp, TokenType::Master)).unwrap();

    let written = fs::read_to_string(tmp.path().join("tokens.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(
        parsed["token_list"][0].as_str().unwrap(),
        tokens.token_list[0]
    );
}

// ── option validation at the operation boundary ─────────────────────────

#[test]
fn unseal_without_passphrase_for_none_container_suggests_flag() {
    let tmp = TempDir::new().unwrap();
    let mut opts = seal_options(&tmp, TokenType::None);
    opts.integrity_type = IntegrityType::None;
    opts.integrity_passphrase = None;
    seal(&opts).unwrap();

    let err = unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(tmp.path().join("restored")),
        passphrase: None,
        integrity_passphrase: None,
        token_source: None,
    })
    .unwrap_err();

    assert_eq!(err.code, codes::UNSEAL_MISSING_PASSPHRASE);
    assert_eq!(err.suggestion.as_deref(), Some("specify --passphrase flag"));
}

#[test]
fn unseal_share_container_without_tokens_fails() {
    let tmp = TempDir::new().unwrap();
    seal(&seal_options(&tmp, TokenType::Share)).unwrap();

    let err = unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(tmp.path().join("restored")),
        passphrase: None,
        integrity_passphrase: Some(SecretString::from("ipw")),
        token_source: None,
    })
    .unwrap_err();

    assert_eq!(err.code, codes::UNSEAL_READ_TOKENS);
}

#[test]
fn unseal_empty_token_list_fails() {
    let tmp = TempDir::new().unwrap();
    seal(&seal_options(&tmp, TokenType::Share)).unwrap();

    let err = unseal(&UnsealOptions {
        current_path: Some(tmp.path().join("vault.tvlt")),
        folder_path: Some(tmp.path().join("restored")),
        passphrase: None,
        integrity_passphrase: Some(SecretString::from("ipw")),
        token_source: Some(flag_source(&[])),
    })
    .unwrap_err();

    assert_eq!(err.code, codes::UNSEAL_EMPTY_TOKEN_LIST);
}

#[test]
fn unseal_missing_container_file_is_io_error() {
    let err = unseal(&UnsealOptions {
        current_path: Some(PathBuf::from("/nonexistent/vault.tvlt")),
        folder_path: Some(PathBuf::from("/tmp/out")),
        passphrase: Some(SecretString::from("p1")),
        integrity_passphrase: None,
        token_source: None,
    })
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Io);
    assert_eq!(err.code, codes::UNSEAL_OPEN_CONTAINER);
}
