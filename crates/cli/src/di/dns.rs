use relay_dns_application::events::RelayEventEmitter;
use relay_dns_application::ports::{CacheStore, SystemClock, UpstreamForwarder};
use relay_dns_application::services::ResponseAssembler;
use relay_dns_application::use_cases::{RelayEngine, RelayOptions};
use relay_dns_domain::Config;
use relay_dns_infrastructure::dns::{DnsCache, DnsCacheConfig, FailoverForwarder};
use relay_dns_jobs::StatsReportJob;
use std::sync::Arc;
use tracing::info;

pub struct DnsServices {
    pub engine: Arc<RelayEngine>,
    pub cache: Arc<DnsCache>,
    pub stats_report: StatsReportJob,
}

impl DnsServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        info!("Initializing relay services");

        let cache = Arc::new(DnsCache::new(DnsCacheConfig::from(&config.cache)));
        let forwarder = Self::build_forwarder(config)?;
        let (emitter, events) = RelayEventEmitter::new_enabled();

        let options = RelayOptions {
            cache_enabled: config.cache.enabled,
            failure_policy: config.relay.failure_policy,
            malformed_policy: config.relay.malformed_policy,
        };

        let engine = Arc::new(RelayEngine::new(
            cache.clone() as Arc<dyn CacheStore>,
            forwarder,
            Arc::new(SystemClock),
            ResponseAssembler::new(config.relay.recursion_available),
            emitter,
            options,
        ));

        let stats_report = StatsReportJob::new(events)
            .with_interval(config.relay.stats_interval_secs)
            .with_cache(cache.clone() as Arc<dyn CacheStore>);

        Ok(Self {
            engine,
            cache,
            stats_report,
        })
    }

    fn build_forwarder(config: &Config) -> anyhow::Result<Arc<dyn UpstreamForwarder>> {
        let forwarder = FailoverForwarder::from_config(config)?;

        info!(
            upstreams = ?config.upstream.servers,
            attempt_timeout_ms = config.upstream.attempt_timeout_ms,
            total_timeout_ms = config.upstream.total_timeout_ms,
            "Upstream forwarder configured"
        );

        Ok(Arc::new(forwarder))
    }
}
