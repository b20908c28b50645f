/// API for observing EMA.
pub trait EmaIF {
    /// return the current value.
    fn get_fast(&self) -> f64;
    /// return the secondary (slow) value.
    fn get_slow(&self) -> f64 {
        unimplemented!()
    }
    /// return a ratio of short / long statistics.
    fn trend(&self) -> f64 {
        unimplemented!()
    }
}

/// API for Exponential Moving Average, EMA, like `get`, `reset`, `update` and so on.
pub trait EmaMutIF: EmaIF {
    /// the type of the argument of `update`.
    type Input;
    /// catch up with the current state.
    fn update(&mut self, x: Self::Input);
    /// set both curves to a value.
    fn reset_to(&mut self, _x: f64) {}
}

/// Exponential Moving Average with a single smoothing factor.
#[derive(Clone, Debug)]
pub struct Ema {
    val: f64,
    sca: f64,
}

impl EmaIF for Ema {
    fn get_fast(&self) -> f64 {
        self.val
    }
}

impl EmaMutIF for Ema {
    type Input = f64;
    fn update(&mut self, x: Self::Input) {
        self.val = self.sca * x + (1.0 - self.sca) * self.val;
    }
    fn reset_to(&mut self, x: f64) {
        self.val = x;
    }
}

impl Ema {
    pub fn new(s: usize) -> Ema {
        Ema {
            val: 0.0,
            sca: 1.0 / (s as f64),
        }
    }
    /// set the initial value.
    pub fn with_value(mut self, x: f64) -> Ema {
        self.val = x;
        self
    }
}

/// Exponential Moving Average pair: a fast and a slow curve over the same
/// input stream. `trend` compares them.
#[derive(Clone, Debug)]
pub struct Ema2 {
    fast: f64,
    slow: f64,
    fe: f64,
    se: f64,
}

impl EmaIF for Ema2 {
    fn get_fast(&self) -> f64 {
        self.fast
    }
    fn get_slow(&self) -> f64 {
        self.slow
    }
    fn trend(&self) -> f64 {
        self.fast / self.slow
    }
}

impl EmaMutIF for Ema2 {
    type Input = f64;
    fn update(&mut self, x: Self::Input) {
        self.fast = self.fe * x + (1.0 - self.fe) * self.fast;
        self.slow = self.se * x + (1.0 - self.se) * self.slow;
    }
    fn reset_to(&mut self, x: f64) {
        self.fast = x;
        self.slow = x;
    }
}

impl Ema2 {
    pub fn new(len: usize) -> Ema2 {
        Ema2 {
            fast: 0.0,
            slow: 0.0,
            fe: 1.0 / (len as f64),
            se: 1.0 / (len as f64),
        }
    }
    // set secondary EMA parameter
    pub fn with_slow(mut self, s: usize) -> Ema2 {
        self.se = 1.0 / (s as f64);
        self
    }
    /// set the initial value.
    pub fn with_value(mut self, x: f64) -> Self {
        self.fast = x;
        self.slow = x;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_converges() {
        let mut e = Ema::new(4);
        for _ in 0..100 {
            e.update(8.0);
        }
        assert!((e.get_fast() - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_ema2_trend() {
        let mut e = Ema2::new(4).with_slow(64).with_value(1.0);
        // a burst of large values pushes the fast curve over the slow one
        for _ in 0..8 {
            e.update(10.0);
        }
        assert!(1.0 < e.trend());
        // a long quiet stretch pulls it back below
        for _ in 0..512 {
            e.update(1.0);
        }
        assert!(e.trend() < 1.05);
    }
}
