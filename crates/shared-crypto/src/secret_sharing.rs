//! # Shamir Threshold Secret Sharing
//!
//! Splits a secret into `total_shares` pieces such that any `threshold` of
//! them reconstruct it exactly and fewer reveal nothing.
//!
//! ## Scheme
//!
//! The secret is chunked into 56-bit limbs; each limb becomes the constant
//! term of a random degree `threshold - 1` polynomial over the Goldilocks
//! field. Share `j` is the evaluation of every limb polynomial at `x = j`
//! (positions are 1-based; `x = 0` would leak the constant term directly).
//! Reconstruction is Lagrange interpolation at zero.
//!
//! ## Share wire format
//!
//! `[secret_len: u16 LE][one 8-byte LE field element per limb]`
//!
//! Shares travel as opaque byte strings inside consensus round data, so the
//! codec here is the only place that knows their layout.

use crate::errors::{CryptoError, CryptoResult};
use crate::field::FieldElement;
use rand::Rng;

/// Bytes packed into one field element. 2^56 < p, so a chunk is always a
/// canonical element.
const CHUNK_BYTES: usize = 7;

/// Maximum secret length representable in the share header.
const MAX_SECRET_BYTES: usize = u16::MAX as usize;

/// The reconstruction threshold used across consensus: 2/3 of the
/// participant count, rounded down.
///
/// Both the "enough shares collected" gate and the reconstruction call must
/// use this exact value; the two sites must never diverge.
pub fn secret_sharing_threshold(total_participants: usize) -> usize {
    total_participants * 2 / 3
}

/// Split `secret` into `total_shares` shares with the given `threshold`.
///
/// Returns one serialized share per position `1..=total_shares`, in
/// position order.
pub fn encode_secret(
    secret: &[u8],
    total_shares: usize,
    threshold: usize,
) -> CryptoResult<Vec<Vec<u8>>> {
    if secret.is_empty() {
        return Err(CryptoError::EmptySecret);
    }
    if secret.len() > MAX_SECRET_BYTES {
        return Err(CryptoError::SecretTooLong {
            max: MAX_SECRET_BYTES,
            actual: secret.len(),
        });
    }
    if threshold == 0 || total_shares == 0 || threshold > total_shares {
        return Err(CryptoError::InvalidThreshold {
            threshold,
            total: total_shares,
        });
    }

    let chunks = chunk_secret(secret);
    let mut rng = rand::thread_rng();

    // One polynomial per chunk, constant term = the chunk itself.
    let polynomials: Vec<Vec<FieldElement>> = chunks
        .iter()
        .map(|&chunk| {
            let mut coeffs = Vec::with_capacity(threshold);
            coeffs.push(chunk);
            for _ in 1..threshold {
                coeffs.push(FieldElement::new(rng.gen::<u64>()));
            }
            coeffs
        })
        .collect();

    let mut shares = Vec::with_capacity(total_shares);
    for position in 1..=total_shares as u64 {
        let x = FieldElement::new(position);
        let mut share = Vec::with_capacity(2 + chunks.len() * 8);
        share.extend_from_slice(&(secret.len() as u16).to_le_bytes());
        for coeffs in &polynomials {
            share.extend_from_slice(&evaluate(coeffs, x).value().to_le_bytes());
        }
        shares.push(share);
    }
    Ok(shares)
}

/// Reconstruct a secret from exactly `threshold` shares.
///
/// `positions[i]` is the 1-based position share `i` was issued at. Passing
/// any other number of shares is a caller bug and fails with
/// [`CryptoError::WrongShareCount`] rather than reconstructing garbage.
pub fn decode_secret(
    shares: &[Vec<u8>],
    positions: &[u64],
    threshold: usize,
) -> CryptoResult<Vec<u8>> {
    if threshold == 0 {
        return Err(CryptoError::InvalidThreshold {
            threshold,
            total: shares.len(),
        });
    }
    if shares.len() != threshold {
        return Err(CryptoError::WrongShareCount {
            expected: threshold,
            actual: shares.len(),
        });
    }
    if positions.len() != threshold {
        return Err(CryptoError::WrongShareCount {
            expected: threshold,
            actual: positions.len(),
        });
    }
    for (i, &p) in positions.iter().enumerate() {
        if p == 0 {
            return Err(CryptoError::ZeroSharePosition);
        }
        if positions[..i].contains(&p) {
            return Err(CryptoError::DuplicateSharePosition(p));
        }
    }

    let parsed: Vec<(usize, Vec<FieldElement>)> = shares
        .iter()
        .map(|share| parse_share(share))
        .collect::<CryptoResult<_>>()?;

    let secret_len = parsed[0].0;
    let chunk_count = parsed[0].1.len();
    for (len, elements) in &parsed {
        if *len != secret_len || elements.len() != chunk_count {
            return Err(CryptoError::MalformedShare(
                "inconsistent share lengths".to_string(),
            ));
        }
    }

    let xs: Vec<FieldElement> = positions.iter().map(|&p| FieldElement::new(p)).collect();
    let basis = lagrange_basis_at_zero(&xs)?;

    let mut bytes = Vec::with_capacity(chunk_count * CHUNK_BYTES);
    for chunk_index in 0..chunk_count {
        let mut value = FieldElement::new(0);
        for (share_index, (_, elements)) in parsed.iter().enumerate() {
            value = value + elements[chunk_index] * basis[share_index];
        }
        let raw = value.value();
        if raw >> (CHUNK_BYTES * 8) != 0 {
            return Err(CryptoError::MalformedShare(
                "reconstructed chunk exceeds 56 bits".to_string(),
            ));
        }
        bytes.extend_from_slice(&raw.to_le_bytes()[..CHUNK_BYTES]);
    }

    if secret_len > bytes.len() {
        return Err(CryptoError::MalformedShare(
            "declared secret length exceeds share payload".to_string(),
        ));
    }
    bytes.truncate(secret_len);
    Ok(bytes)
}

/// Pack secret bytes into 56-bit field elements, zero-padding the tail.
fn chunk_secret(secret: &[u8]) -> Vec<FieldElement> {
    secret
        .chunks(CHUNK_BYTES)
        .map(|chunk| {
            let mut limb = [0u8; 8];
            limb[..chunk.len()].copy_from_slice(chunk);
            FieldElement::new(u64::from_le_bytes(limb))
        })
        .collect()
}

/// Horner evaluation of a coefficient vector (lowest degree first).
fn evaluate(coeffs: &[FieldElement], x: FieldElement) -> FieldElement {
    let mut result = FieldElement::new(0);
    for &coeff in coeffs.iter().rev() {
        result = result * x + coeff;
    }
    result
}

fn parse_share(share: &[u8]) -> CryptoResult<(usize, Vec<FieldElement>)> {
    if share.len() < 2 + 8 {
        return Err(CryptoError::MalformedShare("share too short".to_string()));
    }
    if (share.len() - 2) % 8 != 0 {
        return Err(CryptoError::MalformedShare(
            "share payload is not a whole number of elements".to_string(),
        ));
    }
    let secret_len = u16::from_le_bytes([share[0], share[1]]) as usize;
    let elements = share[2..]
        .chunks_exact(8)
        .map(|raw| {
            let value = u64::from_le_bytes(raw.try_into().expect("chunks_exact(8)"));
            if value >= crate::field::GOLDILOCKS_PRIME {
                return Err(CryptoError::MalformedShare(
                    "share element out of field range".to_string(),
                ));
            }
            Ok(FieldElement::new(value))
        })
        .collect::<CryptoResult<Vec<_>>>()?;
    Ok((secret_len, elements))
}

/// Lagrange basis values l_j(0) for the given distinct x coordinates.
fn lagrange_basis_at_zero(xs: &[FieldElement]) -> CryptoResult<Vec<FieldElement>> {
    let mut basis = Vec::with_capacity(xs.len());
    for (j, &xj) in xs.iter().enumerate() {
        let mut numerator = FieldElement::new(1);
        let mut denominator = FieldElement::new(1);
        for (m, &xm) in xs.iter().enumerate() {
            if m == j {
                continue;
            }
            numerator = numerator * xm;
            denominator = denominator * (xm - xj);
        }
        let inverse = denominator
            .inverse()
            .ok_or_else(|| CryptoError::MalformedShare("degenerate share positions".to_string()))?;
        basis.push(numerator * inverse);
    }
    Ok(basis)
}
