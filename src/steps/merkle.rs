//! SHA-256 Merkle tree over an allowlist.
//!
//! Leaves are `sha256(identity)`, interior nodes hash the sorted pair of
//! their children so a proof is just the list of siblings. An odd node at
//! any level is promoted unchanged.

use sha2::{Digest, Sha256};

pub type Hash = [u8; 32];

/// Canonical form of an identity: trimmed, lowercased.
pub fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}

/// Normalize, drop empties and duplicates, and sort.
pub fn canonical_members<S: AsRef<str>>(identities: &[S]) -> Vec<String> {
    let mut members: Vec<String> = identities
        .iter()
        .map(|i| normalize_identity(i.as_ref()))
        .filter(|i| !i.is_empty())
        .collect();
    members.sort();
    members.dedup();
    members
}

pub fn leaf_hash(identity: &str) -> Hash {
    Sha256::digest(normalize_identity(identity).as_bytes()).into()
}

fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = Sha256::new();
    hasher.update(first);
    hasher.update(second);
    hasher.finalize().into()
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [a, b] => hash_pair(a, b),
            [a] => *a,
            _ => unreachable!("chunks(2) yields one or two elements"),
        })
        .collect()
}

/// Root over canonical members. `None` for an empty list.
pub fn root<S: AsRef<str>>(identities: &[S]) -> Option<Hash> {
    let members = canonical_members(identities);
    let mut level: Vec<Hash> = members.iter().map(|m| leaf_hash(m)).collect();
    if level.is_empty() {
        return None;
    }
    while level.len() > 1 {
        level = next_level(&level);
    }
    Some(level[0])
}

/// Sibling path proving `identity` is a member, or `None` if it is not.
pub fn proof<S: AsRef<str>>(identities: &[S], identity: &str) -> Option<Vec<Hash>> {
    let members = canonical_members(identities);
    let target = normalize_identity(identity);
    let mut index = members.iter().position(|m| *m == target)?;
    let mut level: Vec<Hash> = members.iter().map(|m| leaf_hash(m)).collect();
    let mut siblings = Vec::new();

    while level.len() > 1 {
        let sibling = index ^ 1;
        if sibling < level.len() {
            siblings.push(level[sibling]);
        }
        level = next_level(&level);
        index /= 2;
    }
    Some(siblings)
}

pub fn verify(root: &Hash, identity: &str, proof: &[Hash]) -> bool {
    let computed = proof
        .iter()
        .fold(leaf_hash(identity), |acc, sibling| hash_pair(&acc, sibling));
    &computed == root
}

/// `0x`-prefixed lowercase hex, the form stored in checkpoints.
pub fn to_hex(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

pub fn from_hex(value: &str) -> Option<Hash> {
    let bytes = hex::decode(value.strip_prefix("0x").unwrap_or(value)).ok()?;
    bytes.try_into().ok()
}
