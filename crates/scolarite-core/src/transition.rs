//! The status transition table.
//!
//! This is the single source of truth for which lifecycle transitions are
//! legal. Every mutation path consults [`ensure`] before writing `statut`;
//! nothing else in the system sets the field. A request for a transition not
//! listed here fails loudly with [`Error::InvalidTransition`] — the engine
//! never silently no-ops an illegal request.

use crate::{
  Error, Result,
  student::StudentStatus::{self, *},
};

/// Legal `(source, target)` pairs. Guards beyond the source status (alumni
/// flag, exclusion motive, pending request) are enforced by the store
/// operations that own those fields.
///
/// Activation is permitted from both `Valide` (first entry into active
/// status after validation) and `Desactive` (admin reactivation).
const LEGAL: &[(StudentStatus, StudentStatus)] = &[
  (Brouillon, EnAttente),
  (EnAttente, Valide),
  (EnAttente, Rejette),
  (Valide, Actif),
  (Desactive, Actif),
  (Actif, Desactive),
  (Actif, Ancien),
  (Suspendu, Ancien),
  (Ancien, ReinscriptionEnAttente),
  (ReinscriptionEnAttente, Valide),
];

/// Whether the transition `from -> to` appears in the table.
pub fn is_legal(from: StudentStatus, to: StudentStatus) -> bool {
  LEGAL.contains(&(from, to))
}

/// Fail with [`Error::InvalidTransition`] unless `from -> to` is legal.
pub fn ensure(from: StudentStatus, to: StudentStatus) -> Result<()> {
  if is_legal(from, to) {
    Ok(())
  } else {
    Err(Error::InvalidTransition { from, to })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL: [StudentStatus; 9] = [
    Brouillon,
    EnAttente,
    Valide,
    Rejette,
    Actif,
    Suspendu,
    Desactive,
    Ancien,
    ReinscriptionEnAttente,
  ];

  #[test]
  fn table_matches_expected_rows() {
    assert!(is_legal(Brouillon, EnAttente));
    assert!(is_legal(EnAttente, Valide));
    assert!(is_legal(EnAttente, Rejette));
    assert!(is_legal(Valide, Actif));
    assert!(is_legal(Desactive, Actif));
    assert!(is_legal(Actif, Desactive));
    assert!(is_legal(Actif, Ancien));
    assert!(is_legal(Suspendu, Ancien));
    assert!(is_legal(Ancien, ReinscriptionEnAttente));
    assert!(is_legal(ReinscriptionEnAttente, Valide));
  }

  #[test]
  fn every_unlisted_pair_is_rejected() {
    for from in ALL {
      for to in ALL {
        if LEGAL.contains(&(from, to)) {
          continue;
        }
        let err = ensure(from, to).unwrap_err();
        assert!(
          matches!(err, Error::InvalidTransition { from: f, to: t } if f == from && t == to),
          "expected InvalidTransition for {from} -> {to}"
        );
      }
    }
  }

  #[test]
  fn rejected_is_a_sink_state() {
    for to in ALL {
      assert!(!is_legal(Rejette, to), "rejette -> {to} must be illegal");
    }
  }

  #[test]
  fn self_transitions_are_illegal() {
    for s in ALL {
      assert!(!is_legal(s, s));
    }
  }
}
