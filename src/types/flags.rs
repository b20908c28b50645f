use bitflags::bitflags;

/// API for object properties.
pub trait FlagIF {
    type FlagType;
    /// return true if the flag is on.
    fn is(&self, flag: Self::FlagType) -> bool;
    /// set the flag.
    fn set(&mut self, f: Self::FlagType, b: bool);
    /// toggle the flag off.
    fn turn_off(&mut self, flag: Self::FlagType);
    /// toggle the flag on.
    fn turn_on(&mut self, flag: Self::FlagType);
}

bitflags! {
    /// Misc flags attached to a variable.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub struct FlagVar: u8 {
        /// the previous assigned value of a var.
        const PHASE        = 0b0000_0001;
        /// the phase a rephase round wants to steer toward.
        const TARGET_PHASE = 0b0000_0010;
        /// the phase in the best assignment found so far.
        const BEST_PHASE   = 0b0000_0100;
        /// the var occurs in a clause, so it's eligible for decisions.
        const ACTIVE       = 0b0000_1000;
        /// the var was removed by an external simplifier.
        const ELIMINATED   = 0b0001_0000;
        /// the var is checked during the current conflict analysis.
        const CA_SEEN      = 0b0010_0000;
        /// minimization found the var not removable; don't retry it.
        const CA_POISON    = 0b0100_0000;
    }
}

impl Default for FlagVar {
    fn default() -> FlagVar {
        FlagVar::empty()
    }
}

impl FlagIF for FlagVar {
    type FlagType = FlagVar;
    #[inline]
    fn is(&self, flag: Self::FlagType) -> bool {
        self.contains(flag)
    }
    #[inline]
    fn set(&mut self, f: Self::FlagType, b: bool) {
        if b {
            self.insert(f);
        } else {
            self.remove(f);
        }
    }
    #[inline]
    fn turn_off(&mut self, flag: Self::FlagType) {
        self.remove(flag);
    }
    #[inline]
    fn turn_on(&mut self, flag: Self::FlagType) {
        self.insert(flag);
    }
}
