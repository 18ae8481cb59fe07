//! Reseal: re-encrypt an existing container in place (or to a new path)
//! with fresh content, updated metadata, and re-keyed tokens.
//!
//! The salt and the data-encryption-key survive a reseal; the nonce never
//! does. Tokens are reissued under the new integrity passphrase when one
//! is given, otherwise under the current one.

use tracing::info;

use tvault_core::error::{codes, Category, VaultError, VaultResult};
use tvault_core::{CompressionType, TokenType};
use tvault_container::Container;
use tvault_crypto::integrity::create_provider;
use tvault_crypto::token::TokenList;

use crate::options::{required, ResealOptions};
use crate::seal::{derive_token_key, issue_tokens, token_key_bytes, write_token_list};
use crate::unseal::recover_data_key;

/// Reseals the container, returning the reissued token list (empty for
/// token type none).
pub fn reseal(opts: &ResealOptions) -> VaultResult<TokenList> {
    opts.validate()?;
    let current = opts
        .current_path
        .as_deref()
        .ok_or_else(|| required(Category::Reseal, codes::CURRENT_PATH_REQUIRED, "current-path"))?;
    let folder = opts
        .folder_path
        .as_deref()
        .ok_or_else(|| required(Category::Reseal, codes::FOLDER_PATH_REQUIRED, "folder-path"))?;

    let mut container = Container::read(current).map_err(|e| {
        VaultError::io(
            Category::Reseal,
            codes::RESEAL_OPEN_CONTAINER,
            "failed to open container",
        )
        .wrap(e)
    })?;

    // recover exactly as unseal would, with the current credentials
    let k_data = recover_data_key(
        &container,
        opts.passphrase.as_ref(),
        opts.integrity_current_passphrase.as_ref(),
        opts.token_source.as_ref(),
        Category::Reseal,
    )?;

    container.metadata_mut().apply_update(
        opts.name.as_deref(),
        opts.comment.as_deref(),
        opts.tags.clone(),
    );

    if container.header().compression_type != CompressionType::Zip {
        return Err(VaultError::format(
            Category::Compression,
            codes::NONE_COMPRESSION_UNIMPLEMENTED,
            "compression type none unimplemented",
        ));
    }
    let plaintext = tvault_archive::pack(folder).map_err(|e| {
        VaultError::internal(
            Category::Reseal,
            codes::RESEAL_REARCHIVE,
            "failed to compress folder",
        )
        .wrap(e)
    })?;

    // same salt, same key, fresh nonce
    container.encrypt(&plaintext, &k_data)?;

    if let Some(new_path) = opts.new_path.as_deref() {
        if new_path != current {
            container.set_path(new_path);
        }
    }
    container.write().map_err(|e| {
        VaultError::io(
            Category::Reseal,
            codes::RESEAL_WRITE_CONTAINER,
            "failed to write container",
        )
        .wrap(e)
    })?;

    info!(path = %container.path().display(), "container resealed");

    let header = container.header();
    if header.token_type == TokenType::None {
        return Ok(TokenList::new(Vec::new()));
    }

    let integrity_passphrase = opts
        .integrity_new_passphrase
        .as_ref()
        .or(opts.integrity_current_passphrase.as_ref());
    let k_tok = derive_token_key(header.integrity_type, integrity_passphrase, &header.salt);
    let provider = create_provider(header.integrity_type, token_key_bytes(&k_tok)).map_err(|e| {
        VaultError::internal(
            Category::Reseal,
            codes::RESEAL_REISSUE_TOKENS,
            "failed to create integrity provider",
        )
        .wrap(e)
    })?;

    let list = issue_tokens(
        header.token_type,
        &k_data,
        header.shares,
        header.threshold,
        provider.as_ref(),
        &k_tok,
    )
    .map_err(|e| {
        VaultError::crypto(
            Category::Reseal,
            codes::RESEAL_REISSUE_TOKENS,
            "failed to reissue tokens",
        )
        .wrap(e)
    })?;

    write_token_list(&opts.token_sink, &list, Category::Reseal)?;
    Ok(list)
}
