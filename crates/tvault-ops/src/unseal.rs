//! Unseal: container → data-encryption-key recovery → AES-GCM open →
//! folder extraction.

use secrecy::SecretString;
use tracing::info;

use tvault_core::error::{codes, Category, VaultError, VaultResult};
use tvault_core::io::{Format, Source};
use tvault_core::{CompressionType, TokenType, KEY_LEN};
use tvault_container::Container;
use tvault_crypto::integrity::create_provider_by_id;
use tvault_crypto::token::{self, TokenList};
use tvault_crypto::{derive_key, shamir, DataKey, Share};

use crate::options::{required, UnsealOptions};
use crate::seal::{derive_token_key, token_key_bytes};

/// Unseals a container into the target folder.
pub fn unseal(opts: &UnsealOptions) -> VaultResult<()> {
    opts.validate()?;
    let current = opts
        .current_path
        .as_deref()
        .ok_or_else(|| required(Category::Unseal, codes::CURRENT_PATH_REQUIRED, "current-path"))?;
    let folder = opts
        .folder_path
        .as_deref()
        .ok_or_else(|| required(Category::Unseal, codes::FOLDER_PATH_REQUIRED, "folder-path"))?;

    let container = Container::read(current).map_err(|e| {
        VaultError::io(
            Category::Unseal,
            codes::UNSEAL_OPEN_CONTAINER,
            "failed to open container",
        )
        .wrap(e)
    })?;

    let k_data = recover_data_key(
        &container,
        opts.passphrase.as_ref(),
        opts.integrity_passphrase.as_ref(),
        opts.token_source.as_ref(),
        Category::Unseal,
    )?;

    // auth failures keep their own code so tampering is distinguishable
    // from format drift
    let plaintext = container.decrypt(&k_data)?;

    unpack_content(&plaintext, folder, container.header().compression_type)?;

    info!(path = %current.display(), folder = %folder.display(), "container unsealed");

    Ok(())
}

fn unpack_content(
    content: &[u8],
    folder: &std::path::Path,
    compression_type: CompressionType,
) -> VaultResult<()> {
    match compression_type {
        CompressionType::Zip => tvault_archive::unpack(content, folder).map_err(|e| {
            VaultError::internal(
                Category::Unseal,
                codes::UNSEAL_UNPACK_CONTENT,
                "failed to unpack container content",
            )
            .wrap(e)
        }),
        CompressionType::None => Err(VaultError::format(
            Category::Compression,
            codes::NONE_COMPRESSION_UNIMPLEMENTED,
            "compression type none unimplemented",
        )),
    }
}

/// Recovers the data-encryption-key for the container's token type.
///
/// Shared by unseal and reseal; `category` tags the errors with the
/// calling operation.
pub(crate) fn recover_data_key(
    container: &Container,
    passphrase: Option<&SecretString>,
    integrity_passphrase: Option<&SecretString>,
    token_source: Option<&Source>,
    category: Category,
) -> VaultResult<DataKey> {
    let header = container.header();

    match header.token_type {
        TokenType::None => {
            let passphrase = passphrase.ok_or_else(|| {
                VaultError::validation(
                    category,
                    codes::UNSEAL_MISSING_PASSPHRASE,
                    "passphrase is required for this container",
                    "specify --passphrase flag",
                )
            })?;
            Ok(derive_key(passphrase, &header.salt, header.iterations))
        }
        TokenType::Master | TokenType::Share => {
            let source = token_source.ok_or_else(|| {
                VaultError::validation(
                    category,
                    codes::UNSEAL_READ_TOKENS,
                    "token(s) is required for this container",
                    "provide tokens via the --token-reader-* flags",
                )
            })?;

            // tokens are decrypted under the key derived from the current
            // integrity passphrase and the container salt
            let k_tok = derive_token_key(header.integrity_type, integrity_passphrase, &header.salt);

            let tokens = read_tokens(source, token_key_bytes(&k_tok), category)?;

            match header.token_type {
                TokenType::Master => master_key_from_token(&tokens[0], category),
                _ => {
                    let shares = shares_from_tokens(&tokens, category)?;
                    let provider =
                        create_provider_by_id(shares[0].provider_id, token_key_bytes(&k_tok))?;
                    let secret = shamir::combine(&shares, provider.as_ref())?;
                    key_from_bytes(&secret, category)
                }
            }
        }
    }
}

fn read_tokens(
    source: &Source,
    k_tok: &[u8],
    category: Category,
) -> VaultResult<Vec<token::Token>> {
    let text = source.read_to_string(category)?;

    let list = match source.format() {
        Format::Json => TokenList::from_json(&text)?,
        Format::Plaintext => TokenList::from_plaintext(&text),
    };
    if list.token_list.is_empty() {
        return Err(VaultError::format(
            category,
            codes::UNSEAL_EMPTY_TOKEN_LIST,
            "token list is empty",
        ));
    }

    let key = (!k_tok.is_empty()).then_some(k_tok);
    list.token_list
        .iter()
        .map(|encoded| token::parse(encoded, key))
        .collect()
}

fn master_key_from_token(token: &token::Token, category: Category) -> VaultResult<DataKey> {
    let bytes = hex::decode(&token.value).map_err(|e| {
        VaultError::format(
            category,
            codes::UNSEAL_MASTER_KEY_HEX,
            "failed to decode master key hex",
        )
        .wrap(e)
    })?;
    key_from_bytes(&bytes, category)
}

fn shares_from_tokens(tokens: &[token::Token], category: Category) -> VaultResult<Vec<Share>> {
    tokens
        .iter()
        .map(|token| {
            let value = hex::decode(&token.value).map_err(|e| {
                VaultError::format(
                    category,
                    codes::TOKEN_VALUE_HEX,
                    "failed to decode share value hex",
                )
                .wrap(e)
            })?;
            let signature = hex::decode(&token.signature).map_err(|e| {
                VaultError::format(
                    category,
                    codes::TOKEN_SIGNATURE_HEX,
                    "failed to decode share signature hex",
                )
                .wrap(e)
            })?;
            Ok(Share {
                id: token.id,
                value,
                provider_id: token.provider_id,
                signature,
            })
        })
        .collect()
}

fn key_from_bytes(bytes: &[u8], category: Category) -> VaultResult<DataKey> {
    let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
        VaultError::crypto(
            category,
            codes::KEY_LENGTH,
            format!("recovered key has wrong length: {} bytes", bytes.len()),
        )
    })?;
    Ok(DataKey::from_bytes(bytes))
}
