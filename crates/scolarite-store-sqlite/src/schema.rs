//! SQL schema for the Scolarité SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS students (
    student_id                  TEXT PRIMARY KEY,
    matricule                   TEXT UNIQUE,     -- 'STD{year}-{5 hex}'; NULL until first validation
    nom                         TEXT NOT NULL,
    prenom                      TEXT NOT NULL,
    email                       TEXT NOT NULL UNIQUE,
    statut                      TEXT NOT NULL,
    id_departement              INTEGER,
    id_parcours                 INTEGER,
    est_ancien                  INTEGER NOT NULL DEFAULT 0,
    annee_sortie                INTEGER,
    motif_sortie                TEXT,
    dernier_niveau              TEXT,
    nombre_reinscriptions       INTEGER NOT NULL DEFAULT 0,
    date_derniere_reinscription TEXT,
    motif_reinscription         TEXT,
    motif_rejet                 TEXT,
    date_soumission             TEXT,
    date_validation             TEXT,
    valide_par_admin_id         TEXT,
    date_inscription            TEXT,
    date_creation               TEXT NOT NULL
);

-- One row per student per academic year; the pair is unique by
-- construction and the insert path re-checks it in the same transaction.
CREATE TABLE IF NOT EXISTS inscriptions (
    enrollment_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id       TEXT NOT NULL REFERENCES students(student_id),
    annee_academique TEXT NOT NULL,              -- 'YYYY-YYYY'
    niveau           TEXT NOT NULL,              -- 'L1', 'M2', ...
    id_departement   INTEGER,
    id_parcours      INTEGER,
    date_inscription TEXT NOT NULL,
    date_validation  TEXT,
    statut           TEXT NOT NULL DEFAULT 'en_cours',
    moyenne_annuelle REAL,
    credits_obtenus  INTEGER NOT NULL DEFAULT 0,
    est_admis        INTEGER,                    -- NULL while en_cours
    UNIQUE (student_id, annee_academique)
);

-- Lifecycle-closing events are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS historique_etudiants (
    history_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id       TEXT NOT NULL REFERENCES students(student_id),
    annee_academique TEXT NOT NULL,
    date_debut       TEXT NOT NULL,
    date_fin         TEXT,
    statut           TEXT NOT NULL,              -- 'diplômé' | 'abandon' | 'réinscription_validée' | ...
    niveau           TEXT,
    id_departement   INTEGER,
    id_parcours      INTEGER,
    est_diplome      INTEGER NOT NULL DEFAULT 0,
    motif_fin        TEXT,
    notes            TEXT,
    date_creation    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS students_statut_idx       ON students(statut);
CREATE INDEX IF NOT EXISTS students_est_ancien_idx   ON students(est_ancien);
CREATE INDEX IF NOT EXISTS inscriptions_student_idx  ON inscriptions(student_id);
CREATE INDEX IF NOT EXISTS inscriptions_annee_idx    ON inscriptions(annee_academique, niveau);
CREATE INDEX IF NOT EXISTS historique_student_idx    ON historique_etudiants(student_id);

PRAGMA user_version = 1;
";
