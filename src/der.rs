//! Minimal DER encoder
//!
//! Just enough ASN.1 DER to assemble an RSA SubjectPublicKeyInfo structure
//! from raw modulus/exponent bytes. Provider JWKS documents carry the key
//! material base64url-encoded; rebuilding the standard encoding here keeps
//! key assembly independent of any JWT library.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// rsaEncryption (RFC 8017)
const RSA_ENCRYPTION_OID: &[u64] = &[1, 2, 840, 113549, 1, 1, 1];

/// DER length octets: single byte up to 127, long form above
pub fn length(len: usize) -> Vec<u8> {
    if len <= 0x7F {
        return vec![len as u8];
    }

    let mut bytes = Vec::new();
    let mut remaining = len;
    while remaining > 0 {
        bytes.insert(0, (remaining & 0xFF) as u8);
        remaining >>= 8;
    }

    let mut out = vec![0x80 | bytes.len() as u8];
    out.extend_from_slice(&bytes);
    out
}

/// DER INTEGER from big-endian unsigned bytes
///
/// An empty value encodes as a single zero byte. A set high bit gets a
/// leading zero byte so the value stays non-negative under two's-complement
/// interpretation.
pub fn integer(value: &[u8]) -> Vec<u8> {
    let mut content = if value.is_empty() {
        vec![0x00]
    } else {
        value.to_vec()
    };

    if content[0] & 0x80 != 0 {
        content.insert(0, 0x00);
    }

    let mut out = vec![0x02];
    out.extend_from_slice(&length(content.len()));
    out.extend_from_slice(&content);
    out
}

/// DER SEQUENCE of already-encoded elements
pub fn sequence(elements: &[&[u8]]) -> Vec<u8> {
    let content: Vec<u8> = elements.concat();
    let mut out = vec![0x30];
    out.extend_from_slice(&length(content.len()));
    out.extend_from_slice(&content);
    out
}

/// DER BIT STRING with zero unused bits
pub fn bit_string(content: &[u8]) -> Vec<u8> {
    let mut out = vec![0x03];
    out.extend_from_slice(&length(content.len() + 1));
    out.push(0x00);
    out.extend_from_slice(content);
    out
}

/// DER OBJECT IDENTIFIER
///
/// First byte is 40 * arc1 + arc2; remaining arcs are base-128 with the
/// continuation bit set on all but the last byte.
pub fn object_identifier(arcs: &[u64]) -> Vec<u8> {
    let mut content = vec![(40 * arcs[0] + arcs[1]) as u8];
    for &arc in &arcs[2..] {
        content.extend_from_slice(&base128(arc));
    }

    let mut out = vec![0x06];
    out.extend_from_slice(&length(content.len()));
    out.extend_from_slice(&content);
    out
}

/// DER NULL
pub fn null() -> Vec<u8> {
    vec![0x05, 0x00]
}

/// Base-128 encoding of a single OID arc
fn base128(value: u64) -> Vec<u8> {
    if value == 0 {
        return vec![0x00];
    }

    let mut out = Vec::new();
    let mut remaining = value;
    while remaining > 0 {
        out.insert(0, (remaining & 0x7F) as u8 | 0x80);
        remaining >>= 7;
    }

    let last = out.len() - 1;
    out[last] &= 0x7F;
    out
}

/// SubjectPublicKeyInfo DER for an RSA key
///
/// RSAPublicKey ::= SEQUENCE { modulus INTEGER, publicExponent INTEGER },
/// wrapped in a BIT STRING next to the rsaEncryption AlgorithmIdentifier.
pub fn rsa_public_key_to_spki(n: &[u8], e: &[u8]) -> Vec<u8> {
    let rsa_public_key = sequence(&[&integer(n), &integer(e)]);

    let algorithm_identifier = sequence(&[&object_identifier(RSA_ENCRYPTION_OID), &null()]);

    sequence(&[&algorithm_identifier, &bit_string(&rsa_public_key)])
}

/// Frame DER bytes as a PEM PUBLIC KEY block, wrapped at 64 columns
pub fn spki_to_pem(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);

    let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
    for chunk in encoded.as_bytes().chunks(64) {
        // chunks of an ASCII string are valid UTF-8
        pem.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        pem.push('\n');
    }
    pem.push_str("-----END PUBLIC KEY-----\n");
    pem
}
