// ============================================================================
// MarkFlow - English Translation Table
// ============================================================================
//
// 文件: src/i18n/en_us.rs
// 职责: English translation content definition
// 边界:
//   - ✅ English translation strings definition
//   - ✅ Translation key-value pairs maintenance
//   - ❌ Should not contain translation logic
//   - ❌ Should not contain business logic
//
// ============================================================================

/// English translation table
pub const TRANSLATIONS: &[(&str, &str)] = &[
    // Manifest loading
    ("manifest.loading", "Loading manifest: {}"),
    (
        "manifest.loaded",
        "Loaded {} manifest file(s): {} markers, {} declarations",
    ),
    (
        "manifest.malformed",
        "{} malformed declaration(s) will be reported as structural failures",
    ),
    ("manifest.no_markers", "Manifest defines no markers, nothing to process"),
    // Run command
    ("run.start", "Processing markers from {}"),
    ("run.options", "Merge policy: {}, test mode: {}, scopes: [{}]"),
    ("run.completed", "All declarations processed successfully"),
    (
        "run.partial",
        "{} declaration(s) failed, continuing because partial results are allowed",
    ),
    ("run.failed", "{} declaration(s) failed permanently"),
    // Analyze command
    ("cli.analyze.start", "Analyzing marker dependencies..."),
    ("output.analysis_result", "Dependency Plan"),
    ("output.discovery_order", "Discovery order: {}"),
    ("output.total_units", "Total units: {}"),
    ("output.total_stages", "Processing stages: {}"),
    ("output.skipped_test_only", "Skipped test-only declarations: {}"),
    ("output.no_cycles", "No circular dependencies found"),
    ("output.stages", "Processing Stages"),
    ("output.stage_info", "Stage {} ({} units):"),
    ("output.no_dependencies", "no dependencies"),
    ("output.depends_on_count", "depends on {} units"),
    ("output.unknown_unit", "unknown unit"),
    ("output.required_by", "required by: {}"),
    (
        "output.usage_tip",
        "Use --detail to show dependencies, or -f json for machine-readable output",
    ),
    // Summary
    ("summary.title", "Processing Summary"),
    ("summary.total_markers", "Markers: {}"),
    ("summary.total_units", "Units: {} ({} delegates)"),
    ("summary.total_stages", "Stages: {}"),
    ("summary.processed", "Processed: {}"),
    ("summary.failed", "Failed: {}"),
    ("summary.skipped_test_only", "Skipped (test only): {}"),
    ("summary.rounds", "Retry rounds: {}"),
    ("summary.duration", "Duration: {}s"),
    ("summary.cycles", "Circular Dependencies"),
    ("summary.cycle_header", "Cycle {}:"),
    (
        "summary.relaxed",
        "Ordering constraints relaxed to break cycles at: {}",
    ),
    ("summary.entries", "Marker Entries"),
    ("summary.entry_line", "{} {}: {}/{} processed in {} passes"),
    ("summary.failures", "Failures ({})"),
    ("summary.generated", "Generated Fragments ({})"),
    // Init command
    ("init.start", "Initializing MarkFlow project files..."),
    ("init.file_exists", "File already exists, kept: {}"),
    ("init.use_force_hint", "Use --force to overwrite existing files"),
    ("init.file_created", "Created: {}"),
    (
        "init.next_steps",
        "Edit [scan] packages to set the scopes, then run: markflow run <manifest>",
    ),
    (
        "init.next_steps_sample",
        "Try the sample with: markflow run {}",
    ),
    ("init.create_failed", "Failed to write {}"),
    // Errors
    ("error.path_not_exist", "Path does not exist: {}"),
    ("error.load_manifest", "Failed to load manifest: {}"),
];
