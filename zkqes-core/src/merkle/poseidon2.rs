//! Poseidon2 permutation over the BN254 scalar field, width 3.
//!
//! Structure per the Poseidon2 design: an initial external matrix
//! multiplication, `FULL_ROUNDS/2` external rounds, `PARTIAL_ROUNDS`
//! internal rounds, and `FULL_ROUNDS/2` closing external rounds. The S-box
//! is `x^5`; the external matrix is `circ(2, 1, 1)`; the internal matrix is
//! the all-ones matrix plus `diag(1, 1, 2)`.
//!
//! Round constants are derived once by SHA-256 counter expansion of a fixed
//! domain tag and reduced into the field. The permutation is therefore fully
//! determined by this module; a proving backend must be configured with the
//! same parameter set to reproduce it.

use ark_bn254::Fr;
use ark_ff::{Field, PrimeField, Zero};
use sha2::{Digest as Sha2Digest, Sha256};
use std::sync::OnceLock;

/// Permutation width.
pub const WIDTH: usize = 3;

/// External (full) rounds, split evenly around the internal rounds.
pub const FULL_ROUNDS: usize = 8;

/// Internal (partial) rounds.
pub const PARTIAL_ROUNDS: usize = 56;

/// Domain tag for round-constant derivation.
const DOMAIN_TAG: &[u8] = b"zkqes-poseidon2-bn254-t3";

/// Round constants for one Poseidon2 instance.
pub struct Poseidon2Params {
    external_rc: [[Fr; WIDTH]; FULL_ROUNDS],
    internal_rc: [Fr; PARTIAL_ROUNDS],
}

fn derive_constant(counter: u32) -> Fr {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_TAG);
    hasher.update(counter.to_be_bytes());
    Fr::from_be_bytes_mod_order(hasher.finalize().as_slice())
}

/// The memoized parameter set.
pub fn params() -> &'static Poseidon2Params {
    static PARAMS: OnceLock<Poseidon2Params> = OnceLock::new();
    PARAMS.get_or_init(|| {
        let mut counter = 0u32;
        let mut next = || {
            let c = derive_constant(counter);
            counter += 1;
            c
        };
        let external_rc =
            std::array::from_fn(|_| [next(), next(), next()]);
        let internal_rc = std::array::from_fn(|_| next());
        Poseidon2Params {
            external_rc,
            internal_rc,
        }
    })
}

fn sbox(x: Fr) -> Fr {
    let x2 = x.square();
    x2.square() * x
}

/// Multiplication by the external matrix `circ(2, 1, 1)`:
/// each lane becomes itself plus the lane sum.
fn matmul_external(state: &mut [Fr; WIDTH]) {
    let sum = state[0] + state[1] + state[2];
    for lane in state.iter_mut() {
        *lane += sum;
    }
}

/// Multiplication by the internal matrix, the all-ones matrix plus
/// `diag(1, 1, 2)`.
fn matmul_internal(state: &mut [Fr; WIDTH]) {
    let sum = state[0] + state[1] + state[2];
    state[2].double_in_place();
    for lane in state.iter_mut() {
        *lane += sum;
    }
}

/// Applies the Poseidon2 permutation to a width-3 state.
pub fn permute(mut state: [Fr; WIDTH]) -> [Fr; WIDTH] {
    let params = params();

    matmul_external(&mut state);

    for round in 0..FULL_ROUNDS / 2 {
        for (lane, rc) in state.iter_mut().zip(&params.external_rc[round]) {
            *lane += rc;
            *lane = sbox(*lane);
        }
        matmul_external(&mut state);
    }

    for round in 0..PARTIAL_ROUNDS {
        state[0] += params.internal_rc[round];
        state[0] = sbox(state[0]);
        matmul_internal(&mut state);
    }

    for round in FULL_ROUNDS / 2..FULL_ROUNDS {
        for (lane, rc) in state.iter_mut().zip(&params.external_rc[round]) {
            *lane += rc;
            *lane = sbox(*lane);
        }
        matmul_external(&mut state);
    }

    state
}

/// Two-to-one compression: permute `[left, right, 0]`, take the first lane.
pub fn compress(left: Fr, right: Fr) -> Fr {
    permute([left, right, Fr::zero()])[0]
}
