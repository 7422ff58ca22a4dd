//! Encryption of entry content under a diary key, and re-encryption when
//! the governing key changes.
//!
//! `value` and each block are encrypted independently under the same diary
//! key. [`rekey`] is the single migration primitive: both moving an entry
//! to another diary and sharing it go through it, so one entry never ends
//! up with blocks under different keys.

use crate::types::{
    BlockUpsert, CreateDiaryEntry, CreateDiaryEntryRequest, DiaryEntry, DiaryEntryBlock,
    EncryptedBlock, EncryptedBlockUpsert, EncryptedDiaryEntry, UpdateDiaryEntry,
    UpdateDiaryEntryRequest,
};
use diary_crypto::{
    decode_base64, decrypt, decrypt_text, encode_base64, encrypt, encrypt_text, CryptoResult,
    SymmetricKey,
};
use std::collections::HashSet;

/// Fields of an entry that an update writes explicitly and that must
/// therefore not be migrated from the old key.
#[derive(Clone, Debug, Default)]
pub struct TouchedFields {
    pub value: bool,
    pub block_ids: HashSet<String>,
}

impl TouchedFields {
    /// Nothing touched: migrate the whole entry.
    pub fn none() -> Self {
        Self::default()
    }

    /// The value if it is being replaced, plus every upserted or deleted
    /// block id.
    pub fn from_update(update: &UpdateDiaryEntry) -> Self {
        let block_ids = update
            .blocks_to_upsert
            .iter()
            .filter_map(|b| b.id.clone())
            .chain(update.blocks_to_delete.iter().cloned())
            .collect();
        Self {
            value: update.value.is_some(),
            block_ids,
        }
    }
}

/// Content migrated from the old key to the new one.
#[derive(Clone, Debug, Default)]
pub struct RekeyedContent {
    /// `None` when the value was touched.
    pub value: Option<String>,
    pub blocks: Vec<EncryptedBlock>,
}

/// Moves one Base64 ciphertext from `old_key` to `new_key`. Works on bytes,
/// so content does not have to be valid UTF-8 to survive a migration.
fn reencrypt(ciphertext: &str, old_key: &SymmetricKey, new_key: &SymmetricKey) -> CryptoResult<String> {
    let plaintext = zeroize::Zeroizing::new(decrypt(old_key, &decode_base64(ciphertext)?)?);
    Ok(encode_base64(&encrypt(new_key, &plaintext)?))
}

/// Re-encrypts every untouched field of `entry` from `old_key` to `new_key`.
pub fn rekey(
    entry: &EncryptedDiaryEntry,
    old_key: &SymmetricKey,
    new_key: &SymmetricKey,
    touched: &TouchedFields,
) -> CryptoResult<RekeyedContent> {
    let value = if touched.value {
        None
    } else {
        Some(reencrypt(&entry.value, old_key, new_key)?)
    };

    let blocks = entry
        .blocks
        .iter()
        .filter(|block| !touched.block_ids.contains(&block.id))
        .map(|block| {
            Ok(EncryptedBlock {
                id: block.id.clone(),
                value: reencrypt(&block.value, old_key, new_key)?,
            })
        })
        .collect::<CryptoResult<Vec<_>>>()?;

    Ok(RekeyedContent { value, blocks })
}

/// Decrypts the value and every block of an entry under `key`.
pub fn decrypt_entry(entry: &EncryptedDiaryEntry, key: &SymmetricKey) -> CryptoResult<DiaryEntry> {
    let blocks = entry
        .blocks
        .iter()
        .map(|block| {
            Ok(DiaryEntryBlock {
                id: block.id.clone(),
                value: decrypt_text(key, &block.value)?,
            })
        })
        .collect::<CryptoResult<Vec<_>>>()?;

    Ok(DiaryEntry {
        id: entry.id.clone(),
        diary_id: entry.diary_id.clone(),
        name: entry.name.clone(),
        date: entry.date,
        value: decrypt_text(key, &entry.value)?,
        blocks,
    })
}

/// Encrypts a value and a set of block writes under `key`.
pub fn encrypt_for_write(
    value: &str,
    blocks: &[BlockUpsert],
    key: &SymmetricKey,
) -> CryptoResult<(String, Vec<EncryptedBlockUpsert>)> {
    Ok((encrypt_text(key, value)?, encrypt_blocks(blocks, key)?))
}

fn encrypt_blocks(blocks: &[BlockUpsert], key: &SymmetricKey) -> CryptoResult<Vec<EncryptedBlockUpsert>> {
    blocks
        .iter()
        .map(|block| {
            Ok(EncryptedBlockUpsert {
                id: block.id.clone(),
                value: encrypt_text(key, &block.value)?,
            })
        })
        .collect()
}

/// Builds the wire request for a new entry.
pub fn build_create(entry: &CreateDiaryEntry, key: &SymmetricKey) -> CryptoResult<CreateDiaryEntryRequest> {
    let blocks: Vec<BlockUpsert> = entry.blocks.iter().map(BlockUpsert::new).collect();
    let (value, blocks) = encrypt_for_write(&entry.value, &blocks, key)?;
    Ok(CreateDiaryEntryRequest {
        diary_id: entry.diary_id.clone(),
        name: entry.name.clone(),
        date: entry.date,
        value,
        blocks,
    })
}

/// Builds the wire request for an update of `current`.
///
/// The explicit payload is encrypted under `new_key`. When the update moves
/// the entry to another diary, every untouched field is migrated from
/// `old_key` to `new_key` and merged into the same request. Without a move
/// both keys are the same diary key.
pub fn build_update(
    current: &EncryptedDiaryEntry,
    update: &UpdateDiaryEntry,
    old_key: &SymmetricKey,
    new_key: &SymmetricKey,
) -> CryptoResult<UpdateDiaryEntryRequest> {
    let moving = update
        .diary_id
        .as_deref()
        .is_some_and(|target| target != current.diary_id);

    let mut value = update
        .value
        .as_deref()
        .map(|v| encrypt_text(new_key, v))
        .transpose()?;
    let mut blocks_to_upsert = encrypt_blocks(&update.blocks_to_upsert, new_key)?;

    if moving {
        let migrated = rekey(current, old_key, new_key, &TouchedFields::from_update(update))?;
        if value.is_none() {
            value = migrated.value;
        }
        blocks_to_upsert.extend(migrated.blocks.into_iter().map(|block| EncryptedBlockUpsert {
            id: Some(block.id),
            value: block.value,
        }));
    }

    Ok(UpdateDiaryEntryRequest {
        diary_id: update.diary_id.clone(),
        name: update.name.clone(),
        date: update.date,
        value,
        blocks_to_upsert,
        blocks_to_delete: update.blocks_to_delete.clone(),
    })
}
