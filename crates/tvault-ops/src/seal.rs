//! Seal: folder → archive → AES-GCM container + token list.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::SecretString;
use tracing::info;

use tvault_core::error::{codes, Category, VaultError, VaultResult};
use tvault_core::io::{Format, Sink};
use tvault_core::{IntegrityType, TokenType};
use tvault_container::{Container, Header, Metadata};
use tvault_crypto::integrity::create_provider;
use tvault_crypto::token::{self, Token, TokenList};
use tvault_crypto::{derive_key, shamir, DataKey, IntegrityProvider};

use crate::options::{required, SealOptions, TokenSink};

/// Seals a folder into a fresh container and emits the token list.
///
/// The emitted list is also returned: empty for token type none, one
/// element for master, `n` elements for share.
pub fn seal(opts: &SealOptions) -> VaultResult<TokenList> {
    opts.validate()?;
    let folder = opts
        .folder_path
        .as_deref()
        .ok_or_else(|| required(Category::Seal, codes::FOLDER_PATH_REQUIRED, "folder-path"))?;
    let new_path = opts
        .new_path
        .as_deref()
        .ok_or_else(|| required(Category::Seal, codes::NEW_PATH_REQUIRED, "new-path"))?;
    let passphrase = opts
        .passphrase
        .as_ref()
        .ok_or_else(|| required(Category::Seal, codes::PASSPHRASE_REQUIRED, "passphrase"))?;

    info!(folder = %folder.display(), token_type = opts.token_type.name(), "sealing folder");

    let plaintext = tvault_archive::pack(folder).map_err(|e| {
        VaultError::internal(
            Category::Seal,
            codes::SEAL_COMPRESS_FOLDER,
            "failed to compress folder",
        )
        .wrap(e)
    })?;

    let (shares, threshold) = match opts.token_type {
        TokenType::Share => (opts.shares, opts.threshold),
        _ => (0, 0),
    };
    let header = Header::new(
        opts.compression_type,
        opts.integrity_type,
        opts.token_type,
        shares,
        threshold,
    )?;

    let k_data = derive_key(passphrase, &header.salt, header.iterations);

    let name = new_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());
    let mut container = Container::create(new_path, header, Metadata::new(name));

    container.encrypt(&plaintext, &k_data).map_err(|e| {
        VaultError::crypto(
            Category::Seal,
            codes::SEAL_CREATE_CONTAINER,
            "failed to encrypt container",
        )
        .wrap(e)
    })?;
    container.write().map_err(|e| {
        VaultError::io(
            Category::Seal,
            codes::SEAL_CREATE_CONTAINER,
            "failed to write container",
        )
        .wrap(e)
    })?;

    info!(path = %new_path.display(), "container sealed");

    if opts.token_type == TokenType::None {
        return Ok(TokenList::new(Vec::new()));
    }

    let k_tok = derive_token_key(
        opts.integrity_type,
        opts.integrity_passphrase.as_ref(),
        &container.header().salt,
    );
    let provider = create_provider(opts.integrity_type, token_key_bytes(&k_tok)).map_err(|e| {
        VaultError::internal(
            Category::Seal,
            codes::SEAL_CREATE_PROVIDER,
            "failed to create integrity provider",
        )
        .wrap(e)
    })?;

    let list = issue_tokens(
        opts.token_type,
        &k_data,
        opts.shares,
        opts.threshold,
        provider.as_ref(),
        &k_tok,
    )?;
    write_token_list(&opts.token_sink, &list, Category::Seal)?;
    Ok(list)
}

/// Derives the token-encryption key from the integrity passphrase and the
/// container salt. Absent when the provider is not HMAC or no passphrase
/// was given; the token codec then leaves payloads unencrypted.
pub(crate) fn derive_token_key(
    integrity_type: IntegrityType,
    passphrase: Option<&SecretString>,
    salt: &[u8],
) -> Option<DataKey> {
    match (integrity_type, passphrase) {
        (IntegrityType::Hmac, Some(passphrase)) => {
            Some(derive_key(passphrase, salt, tvault_core::ITERATIONS))
        }
        _ => None,
    }
}

pub(crate) fn token_key_bytes(k_tok: &Option<DataKey>) -> &[u8] {
    k_tok.as_ref().map_or(&[], |k| k.as_bytes())
}

/// Builds the token list for the given token type: one master token
/// wrapping the key, or `n` signed share tokens.
pub(crate) fn issue_tokens(
    token_type: TokenType,
    k_data: &DataKey,
    shares: u8,
    threshold: u8,
    provider: &dyn IntegrityProvider,
    k_tok: &Option<DataKey>,
) -> VaultResult<TokenList> {
    let key = match k_tok {
        Some(k) => Some(k.as_bytes().as_slice()),
        None => None,
    };

    match token_type {
        TokenType::Master => {
            let master = Token {
                version: token::VERSION,
                id: 0,
                token_type: TokenType::Master.as_byte(),
                value: hex::encode(k_data.as_bytes()),
                signature: String::new(),
                provider_id: provider.id(),
            };
            Ok(TokenList::new(vec![encode_token(&master, key)?]))
        }
        TokenType::Share => {
            let shares = shamir::split(
                k_data.as_bytes(),
                shares as usize,
                threshold as usize,
                provider,
            )
            .map_err(|e| {
                VaultError::crypto(
                    Category::Seal,
                    codes::SEAL_SPLIT_KEY,
                    "failed to split data encryption key",
                )
                .wrap(e)
            })?;

            let mut list = Vec::with_capacity(shares.len());
            for share in &shares {
                let token = Token {
                    version: token::VERSION,
                    id: share.id,
                    token_type: TokenType::Share.as_byte(),
                    value: hex::encode(&share.value),
                    signature: hex::encode(&share.signature),
                    provider_id: share.provider_id,
                };
                list.push(encode_token(&token, key)?);
            }
            Ok(TokenList::new(list))
        }
        TokenType::None => Ok(TokenList::new(Vec::new())),
    }
}

fn encode_token(token: &Token, key: Option<&[u8]>) -> VaultResult<String> {
    let raw = token::build(token, key).map_err(|e| {
        VaultError::crypto(
            Category::Seal,
            codes::SEAL_BUILD_TOKEN,
            "failed to build token",
        )
        .wrap(e)
    })?;
    Ok(STANDARD.encode(raw))
}

/// Writes the token list through the configured sink in its wire format.
pub(crate) fn write_token_list(
    sink_opts: &TokenSink,
    list: &TokenList,
    category: Category,
) -> VaultResult<()> {
    let mut sink = Sink::open(&sink_opts.target, sink_opts.format, category)?;
    let result = match sink_opts.format {
        Format::Plaintext => sink.write_text(category, &list.to_plaintext()),
        Format::Json => sink.write_json(category, list),
    };
    result.map_err(|e| {
        VaultError::io(category, codes::SEAL_WRITE_TOKENS, "failed to write token list").wrap(e)
    })
}
