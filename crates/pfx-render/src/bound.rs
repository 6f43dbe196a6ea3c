//! Bind-once wrapper around an effect.

use crate::context::TileContext;
use crate::effect::Effect;
use crate::error::EffectResult;
use pfx_core::{Rect, Surface};
use std::fmt;

/// An effect bound to one run.
///
/// Created once per run by [`BoundEffect::bind`]; rendering a tile is only
/// possible through a bound value, so an effect can never see a tile before
/// its state exists. The bound value owns the run's token snapshot and
/// hands out one independent clone per worker.
pub struct BoundEffect<'e, E: Effect> {
    effect: &'e E,
    token: E::Token,
    state: E::State,
}

impl<'e, E: Effect> BoundEffect<'e, E> {
    /// Snapshots `token` and binds it against `src`.
    pub fn bind(effect: &'e E, token: &E::Token, src: &Surface, dst_bounds: Rect) -> EffectResult<Self> {
        let token = token.clone();
        let state = effect.bind(&token, src, dst_bounds)?;
        Ok(Self { effect, token, state })
    }

    /// The effect.
    pub fn effect(&self) -> &'e E {
        self.effect
    }

    /// The run's token snapshot.
    pub fn token(&self) -> &E::Token {
        &self.token
    }

    /// The state produced by binding.
    pub fn state(&self) -> &E::State {
        &self.state
    }

    /// A fresh token clone for one worker.
    pub fn token_for_worker(&self) -> E::Token {
        self.token.clone()
    }

    /// Renders one tile with the bound state.
    pub fn render_tile(&self, ctx: &mut TileContext<'_, E::Token>) -> EffectResult<()> {
        self.effect.render_tile(&self.state, ctx)
    }
}

impl<E: Effect> fmt::Debug for BoundEffect<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundEffect")
            .field("effect", &self.effect.info().name)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
