//! Number-theoretic and elliptic-curve building blocks for Nebula
//!
//! This crate provides the arithmetic layer underneath Nebula's
//! discrete-log-based key exchange and signature protocols: arbitrary
//! precision integers, the two finite-field families elliptic curves are
//! built over, the curves themselves, a small public-key layer tying curve
//! or modular-exponentiation groups to signing and key agreement, a
//! symmetric cipher registry, and the packet framing used to carry all of
//! the above over a byte-stream transport.
//!
//! The focus is on **clarity, predictability, and auditability**, rather
//! than on providing a large or high-level cryptographic API. Components
//! are explicit in their semantics and suitable for security-critical code.
//!
//! # Module overview
//!
//! - `bigint`
//!   Arbitrary-precision signed integers: classical and Karatsuba
//!   multiplication, Montgomery modular exponentiation, primality testing,
//!   modular square roots, and the Kronecker symbol. The numeric
//!   foundation every other module is built on.
//!
//! - `gf2n`
//!   `GF(2^n)` binary-field arithmetic (field elements, carryless
//!   multiplication, the almost-inverse algorithm) plus the unreduced
//!   binary polynomials (`bpoly`) used to search for and verify
//!   irreducible moduli, and polynomials over `GF(2^n)` itself (`poly`)
//!   used when generating a curve over an extension field.
//!
//! - `ecp`
//!   Elliptic curves over `GF(p)`: affine and Jacobian projective
//!   coordinates, NAF sliding-window scalar multiplication, point
//!   compression, and the parameter-validity checklist a curve must pass
//!   before it is trusted.
//!
//! - `ec2n`
//!   Elliptic curves over `GF(2^n)`: affine-only arithmetic (inversion is
//!   cheap in a binary field, so there is no projective form), the
//!   Frobenius endomorphism, and tau-adic NAF scalar multiplication for
//!   anomalous binary curves.
//!
//!   No signing, verification, or key-agreement logic lives here — only
//!   the curve group structure and the scalar multiplication it supports.
//!
//! - `dlpk`
//!   The discrete-log public-key layer: shared group parameters (interned
//!   so equal parameters are reused rather than duplicated), randomizer
//!   precomputation, key generation, DSA-style signing/verification,
//!   Diffie-Hellman key agreement (plain and unified/authenticated), and
//!   wire serialization for all of the above.
//!
//! - `cipher`
//!   A small symmetric-cipher registry: algorithms and their aliases are
//!   looked up by name, keys are expanded deterministically, and each
//!   registered algorithm exposes a uniform block/transform/IV interface.
//!
//! - `packet`
//!   Length-prefixed packet framing over an arbitrary byte-stream
//!   transport, with buffered egress, flow control, EOF half-closing, and
//!   the ability to hand the underlying transport off to another consumer
//!   mid-stream.
//!
//! - `hash`
//!   Cryptographic hash functions used internally (SHA-1, SHA-256), mainly
//!   for key expansion and randomizer derivation.
//!
//! - `rng`
//!   A ChaCha20-based cryptographically secure pseudorandom generator,
//!   seeded from OS entropy and rekeyed after every output block for
//!   forward secrecy.
//!
//! - `primitives`
//!   Fixed-size, low-level types such as `U256`, used as a common currency
//!   between the hash and bigint layers.
//!
//! - `os`
//!   Environment-facing helpers — OS entropy collection — kept isolated
//!   from the rest of the crate so platform-specific code has one home.
//!
//! # Design goals
//!
//! - Explicit, auditable arithmetic with no hidden allocation surprises
//! - Minimal and explicit APIs
//! - Stable, well-defined semantics
//! - Clear separation between cryptographic code and supporting utilities
//!
//! This crate is not intended to replace full-featured, externally audited
//! cryptographic libraries, but to serve as a small, controlled foundation
//! for Nebula's internal discrete-log cryptography.

mod os;

pub mod bigint;
pub mod cipher;
pub mod dlpk;
pub mod ec2n;
pub mod ecp;
pub mod gf2n;
pub mod hash;
pub mod packet;
pub mod primitives;
pub mod rng;
