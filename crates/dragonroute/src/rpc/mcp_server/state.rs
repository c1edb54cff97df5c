use crate::{
    chains::kaia::KaiaChain,
    config::DragonrouteConfig,
    quote::QuoteEngine,
    route::TradeSizer,
    tokens::TokenRegistry,
};

pub type KaiaTokens = TokenRegistry<KaiaChain>;
pub type KaiaQuoteEngine<'a> = QuoteEngine<'a, KaiaChain, KaiaTokens>;

/// Process-wide server state. Read-only once the server starts.
pub struct SharedState {
    pub cfg: DragonrouteConfig,
    pub chain: KaiaChain,
    pub tokens: KaiaTokens,
    sizer: Box<dyn TradeSizer>,
}

impl SharedState {
    pub fn new(cfg: DragonrouteConfig, sizer: Box<dyn TradeSizer>) -> Self {
        let chain = KaiaChain::from_config(&cfg);
        let tokens = TokenRegistry::new(&cfg.tokens, chain.clone());
        Self {
            cfg,
            chain,
            tokens,
            sizer,
        }
    }

    pub fn engine(&self) -> KaiaQuoteEngine<'_> {
        QuoteEngine::new(
            &self.chain,
            &self.tokens,
            &self.cfg.dragonswap.fee_tiers,
            self.cfg.dragonswap.wrapped_native,
            self.sizer.as_ref(),
        )
    }
}

impl std::fmt::Debug for SharedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedState")
            .field("chain", &self.chain)
            .field("tokens", &self.tokens.symbols())
            .finish_non_exhaustive()
    }
}
