//! Conversion orchestrator: validation, hub routing, and hop sequencing.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use bibhub_core::config::converter::{ConverterConfig, ExitStatusPolicy};
use bibhub_formats::{Direction, FormatCode, FormatRegistry};
use bytes::Bytes;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::ConversionError;
use crate::executor::{ProcessExecutor, ProcessRunner, apply_exit_policy};
use crate::location::ConverterLocation;
use crate::metrics::{ConversionMetrics, MetricsSnapshot};
use crate::models::{ConversionOutput, ConversionPlan, ConversionRequest, Hop, HopReport};
use crate::platform::Platform;

/// Converts bibliography content through the bibutils converters.
///
/// Conversions touching the hub (`xml`) take one converter; every other
/// pair takes two, `source -> xml -> target`, run strictly in sequence.
/// The converter location can be changed at any time; each conversion
/// works against the location current when it was planned.
#[derive(Debug)]
pub struct Converter {
    /// Valid import/export formats.
    registry: Arc<FormatRegistry>,
    /// Runs individual hops.
    runner: Arc<dyn ProcessRunner>,
    /// Host platform, fixed at construction.
    platform: Platform,
    /// Operator-adjustable converter location.
    location: RwLock<Arc<ConverterLocation>>,
    /// Treatment of non-zero converter exits.
    policy: ExitStatusPolicy,
    /// Conversion metrics collector.
    metrics: Arc<ConversionMetrics>,
}

impl Converter {
    /// Create a converter that runs real processes.
    ///
    /// Fails with [`ConversionError::UnsupportedPlatform`] on hosts without
    /// bundled converters.
    pub fn new(config: &ConverterConfig, registry: FormatRegistry) -> Result<Self, ConversionError> {
        let runner = Arc::new(ProcessExecutor::new(config));
        Self::with_runner(config, registry, runner)
    }

    /// Create a converter with a custom hop runner.
    pub fn with_runner(
        config: &ConverterConfig,
        registry: FormatRegistry,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Self, ConversionError> {
        config
            .validate()
            .map_err(|e| ConversionError::InvalidConfig {
                reason: e.to_string(),
            })?;

        let platform = Platform::current()?;
        let location = initial_location(config, platform);

        info!(
            platform = %platform,
            base_dir = %location.base_dir.display(),
            suffix = %location.suffix,
            policy = ?config.exit_status_policy,
            "Converter initialized"
        );

        Ok(Self {
            registry: Arc::new(registry),
            runner,
            platform,
            location: RwLock::new(Arc::new(location)),
            policy: config.exit_status_policy,
            metrics: Arc::new(ConversionMetrics::new()),
        })
    }

    // -- Location override -------------------------------------------------

    /// Look for converters in `path`, with no name suffix.
    pub fn set_binary_path(&self, path: impl Into<PathBuf>) {
        self.set_location(path, None);
    }

    /// Look for converters in `path`, appending `suffix` to every name.
    ///
    /// Applies to conversions planned after this call; conversions already
    /// in flight keep the location they started with.
    pub fn set_location(&self, path: impl Into<PathBuf>, suffix: Option<String>) {
        self.replace_location(ConverterLocation::custom(path, suffix));
    }

    /// Go back to the bundled converters for this platform.
    pub fn reset_location(&self) {
        self.replace_location(ConverterLocation::platform_default(self.platform));
    }

    /// The location the next conversion will use.
    pub fn location(&self) -> Arc<ConverterLocation> {
        match self.location.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn replace_location(&self, location: ConverterLocation) {
        info!(
            base_dir = %location.base_dir.display(),
            suffix = %location.suffix,
            "Converter location changed"
        );
        let location = Arc::new(location);
        match self.location.write() {
            Ok(mut guard) => *guard = location,
            Err(poisoned) => *poisoned.into_inner() = location,
        }
    }

    // -- Planning ----------------------------------------------------------

    /// Validate a request and resolve its hops.
    ///
    /// This is the only place a conversion can fail without a converter
    /// having been started.
    pub fn plan(&self, request: &ConversionRequest) -> Result<ConversionPlan, ConversionError> {
        self.ensure_supported(request.source, Direction::Import)?;
        self.ensure_supported(request.target, Direction::Export)?;

        let location = self.location();
        let hub = self.registry.hub();
        let hop = |source: FormatCode, target: FormatCode, args: &[String]| Hop {
            source,
            target,
            program: location.program_for(source, target),
            args: args.to_vec(),
        };

        let hops = if request.target == hub {
            vec![hop(request.source, hub, &request.source_args)]
        } else if request.source == hub {
            vec![hop(hub, request.target, &request.target_args)]
        } else {
            vec![
                hop(request.source, hub, &request.source_args),
                hop(hub, request.target, &request.target_args),
            ]
        };

        Ok(ConversionPlan { hops, location })
    }

    fn ensure_supported(&self, code: FormatCode, direction: Direction) -> Result<(), ConversionError> {
        if self.registry.supports(code, direction) {
            Ok(())
        } else {
            warn!(code = %code, direction = %direction, "Rejected unsupported format");
            Err(ConversionError::UnsupportedFormat {
                code: code.code().to_string(),
                direction,
            })
        }
    }

    // -- Conversion --------------------------------------------------------

    /// Convert content between two format codes given as strings.
    pub async fn convert_str(
        &self,
        source: &str,
        target: &str,
        content: impl Into<Bytes>,
    ) -> Result<ConversionOutput, ConversionError> {
        let request = ConversionRequest::parse(source, target, content)?;
        self.convert(request).await
    }

    /// Convert a request.
    pub async fn convert(&self, request: ConversionRequest) -> Result<ConversionOutput, ConversionError> {
        self.convert_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Convert a request with cancellation support.
    #[instrument(
        skip(self, request, cancel),
        fields(conversion_id, source = %request.source, target = %request.target)
    )]
    pub async fn convert_with_cancel(
        &self,
        request: ConversionRequest,
        cancel: CancellationToken,
    ) -> Result<ConversionOutput, ConversionError> {
        tracing::Span::current().record("conversion_id", Uuid::now_v7().to_string());

        let plan = self.plan(&request)?;

        self.metrics
            .record_started(request.content.len(), plan.is_two_hop());
        let start = Instant::now();

        match self.execute_plan(&plan, request.content, cancel).await {
            Ok(output) => {
                self.metrics
                    .record_success(start.elapsed(), output.content.len());
                info!(
                    hops = output.hops.len(),
                    output_bytes = output.content.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Conversion completed"
                );
                Ok(output)
            }
            Err(e) => {
                self.metrics.record_failure(&e);
                warn!(error = %e, "Conversion failed");
                Err(e)
            }
        }
    }

    /// Run the hops of a plan in order, feeding each hop's stdout to the
    /// next. The first failing hop ends the conversion.
    ///
    /// The configured [`ExitStatusPolicy`] applies to the last hop; every
    /// earlier hop is judged strictly.
    pub async fn execute_plan(
        &self,
        plan: &ConversionPlan,
        content: Bytes,
        cancel: CancellationToken,
    ) -> Result<ConversionOutput, ConversionError> {
        let mut content = content;
        let mut reports = Vec::with_capacity(plan.hops.len());

        for (index, hop) in plan.hops.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(ConversionError::Cancelled);
            }

            debug!(
                hop = index + 1,
                of = plan.hops.len(),
                program = %hop.program.display(),
                "Running hop"
            );

            let output = self.runner.run(hop, content, cancel.clone()).await?;
            self.metrics.record_hop();
            let policy = if index + 1 == plan.hops.len() {
                self.policy
            } else {
                ExitStatusPolicy::Strict
            };
            let output = apply_exit_policy(&hop.program, output, policy)?;

            reports.push(HopReport {
                program: hop.program.clone(),
                exit_code: output.exit_code,
                stderr: output.stderr,
                output_bytes: output.stdout.len(),
                duration_ms: output.duration_ms,
            });
            content = output.stdout;
        }

        Ok(ConversionOutput {
            content,
            hops: reports,
        })
    }

    // -- Installation check ------------------------------------------------

    /// Check which converter programs exist at the current location.
    ///
    /// Lists every `<format>2xml`, `xml2<format>`, and the normalize tool
    /// the registry could route through.
    pub async fn check_installation(&self) -> Vec<ToolAvailability> {
        let location = self.location();
        let hub = self.registry.hub();

        let mut pairs: Vec<(FormatCode, FormatCode)> = self
            .registry
            .importable()
            .filter(|code| *code != hub)
            .map(|code| (code, hub))
            .collect();
        pairs.push((hub, hub));
        pairs.extend(
            self.registry
                .exportable()
                .filter(|code| *code != hub)
                .map(|code| (hub, code)),
        );

        let mut results = Vec::with_capacity(pairs.len());
        for (source, target) in pairs {
            let program = location.program_for(source, target);
            let available = tokio::fs::metadata(&program)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);

            if available {
                debug!(program = %program.display(), "Converter available");
            } else {
                warn!(program = %program.display(), "Converter NOT available");
            }

            results.push(ToolAvailability {
                program,
                source,
                target,
                available,
            });
        }

        results
    }

    // -- Accessors ---------------------------------------------------------

    /// The format registry used for validation.
    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// The detected host platform.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The configured exit status policy.
    pub fn exit_status_policy(&self) -> ExitStatusPolicy {
        self.policy
    }

    /// Get the metrics collector.
    pub fn metrics(&self) -> &ConversionMetrics {
        &self.metrics
    }

    /// Get a metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Initial location: the bundled converters unless the configuration
/// overrides the directory or the suffix.
fn initial_location(config: &ConverterConfig, platform: Platform) -> ConverterLocation {
    if config.binary_path.is_none() && config.suffix.is_none() {
        return ConverterLocation::platform_default(platform);
    }

    let base_dir = config
        .binary_path
        .clone()
        .unwrap_or_else(|| ConverterLocation::platform_default(platform).base_dir);
    ConverterLocation::custom(base_dir, config.suffix.clone())
}

/// Whether a converter program is installed.
#[derive(Debug, Clone, Serialize)]
pub struct ToolAvailability {
    /// The resolved program path.
    pub program: PathBuf,
    /// Format the program reads.
    pub source: FormatCode,
    /// Format the program writes.
    pub target: FormatCode,
    /// Whether the program exists as a file.
    pub available: bool,
}
