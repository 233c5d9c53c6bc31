//! Particle designators used in classifier suffixes
//!
//! Data names carry particle designators after a colon, `imp:n,p` being
//! the importance card for neutrons and photons. The declaration order
//! below is the canonical output order for rewritten designator lists.

use std::fmt;

use crate::error::KermaError;
use crate::result::Result;

/// One transportable particle kind, named by its designator letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Particle {
    /// `n`
    Neutron,
    /// `p`
    Photon,
    /// `e`
    Electron,
    /// `f`
    Positron,
    /// `q`
    AntiNeutron,
    /// `h`
    Proton,
    /// `g`
    AntiProton,
    /// `l`
    Lambda,
    /// `k`
    Kaon,
    /// `d`
    Deuteron,
    /// `t`
    Triton,
    /// `s`
    Helion,
    /// `a`
    Alpha,
}

impl Particle {
    pub const ALL: [Particle; 13] = [
        Particle::Neutron,
        Particle::Photon,
        Particle::Electron,
        Particle::Positron,
        Particle::AntiNeutron,
        Particle::Proton,
        Particle::AntiProton,
        Particle::Lambda,
        Particle::Kaon,
        Particle::Deuteron,
        Particle::Triton,
        Particle::Helion,
        Particle::Alpha,
    ];

    /// The designator letter, lowercase.
    pub fn letter(self) -> char {
        match self {
            Particle::Neutron => 'n',
            Particle::Photon => 'p',
            Particle::Electron => 'e',
            Particle::Positron => 'f',
            Particle::AntiNeutron => 'q',
            Particle::Proton => 'h',
            Particle::AntiProton => 'g',
            Particle::Lambda => 'l',
            Particle::Kaon => 'k',
            Particle::Deuteron => 'd',
            Particle::Triton => 't',
            Particle::Helion => 's',
            Particle::Alpha => 'a',
        }
    }

    /// Look a particle up by designator letter, either case.
    pub fn from_letter(letter: char) -> Result<Particle> {
        let lower = letter.to_ascii_lowercase();
        Particle::ALL
            .into_iter()
            .find(|p| p.letter() == lower)
            .ok_or_else(|| {
                KermaError::type_mismatch("particle designator", letter.to_string())
            })
    }
}

impl fmt::Display for Particle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}
