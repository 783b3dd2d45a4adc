//! End-to-end compilation of instance groups from manifests and release jobs
//! on disk.

use std::fs;
use std::path::Path;

use mockall::mock;

use boshpod::{Error, InstanceGroupCompiler, Result};
use boshpod_common::k8s::{Container, VolumeMount};
use boshpod_common::manifest::Manifest;
use boshpod_container::{ConverterConfig, Disks, ReleaseImageProvider};

mock! {
    Images {}
    impl ReleaseImageProvider for Images {
        fn release_image(&self, instance_group: &str, job: &str) -> Result<String>;
    }
}

fn images() -> MockImages {
    let mut images = MockImages::new();
    images
        .expect_release_image()
        .returning(|ig, job| Ok(format!("registry/{ig}-{job}:1")));
    images
}

fn write_job(base: &Path, release: &str, job: &str, job_mf: &str, bpm: &str) {
    let dir = base.join("jobs-src").join(release).join(job);
    fs::create_dir_all(dir.join("templates")).unwrap();
    fs::write(dir.join("job.MF"), job_mf).unwrap();
    fs::write(dir.join("templates").join("bpm.yml.erb"), bpm).unwrap();
}

const BPM_TEMPLATE_ENTRY: &str = "templates:\n  bpm.yml.erb: config/bpm.yml\n";

fn release_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();

    write_job(
        base,
        "db",
        "postgres",
        &format!(
            "name: postgres\n{BPM_TEMPLATE_ENTRY}provides:\n- name: db\n  type: database\n  properties: [postgres.port]\nproperties:\n  postgres.port:\n    default: 5432\n"
        ),
        "processes:\n- name: postgres\n  executable: /var/vcap/packages/postgres/bin/postgres\n",
    );

    write_job(
        base,
        "r",
        "jobA",
        &format!(
            "name: jobA\n{BPM_TEMPLATE_ENTRY}consumes:\n- name: database\n  type: database\n- name: cache\n  type: redis\n  optional: true\nproperties:\n  jobA.memory:\n    default: 256Mi\n"
        ),
        r#"processes:
- name: server
  executable: /var/vcap/packages/a/bin/server
  args:
  - --db
  - "{{ links.database.instances[0].address }}:{{ links.database.properties.postgres.port }}"
  limits:
    memory: "{{ p("jobA.memory") }}"
- name: worker
  executable: /var/vcap/packages/a/bin/worker
run:
  healthcheck:
    server:
      readiness:
        exec:
          command: [/bin/ready]
"#,
    );

    write_job(
        base,
        "r",
        "jobB",
        &format!("name: jobB\n{BPM_TEMPLATE_ENTRY}"),
        "processes:\n- name: main\n  executable: /var/vcap/packages/b/bin/main\n",
    );

    write_job(
        base,
        "r",
        "jobC",
        &format!("name: jobC\n{BPM_TEMPLATE_ENTRY}"),
        "processes: []\n",
    );

    write_job(
        base,
        "r",
        "smoke",
        &format!("name: smoke\n{BPM_TEMPLATE_ENTRY}"),
        "processes:\n- name: run\n  executable: /var/vcap/packages/smoke/bin/run\n  args: [--all]\n",
    );

    dir
}

const MANIFEST: &str = r#"
name: app
releases:
- name: r
instance_groups:
- name: db
  instances: 1
  jobs:
  - name: postgres
    release: db
    provides:
      db: {as: primary-db}
- name: ig
  instances: 2
  azs: [z1]
  jobs:
  - name: jobA
    release: r
    consumes:
      database: {from: primary-db}
    properties:
      jobA:
        memory: 1Gi
      quarks:
        envs:
        - name: FEATURE
          value: "on"
  - name: jobB
    release: r
  - name: jobC
    release: r
- name: smoke-tests
  lifecycle: errand
  instances: 1
  jobs:
  - name: smoke
    release: r
"#;

fn default_mounts() -> Vec<VolumeMount> {
    vec![
        VolumeMount::new("rendering-data", "/var/vcap/all-releases"),
        VolumeMount::new("jobs-dir", "/var/vcap/jobs"),
    ]
}

fn pre_stop(container: &Container) -> &str {
    container
        .lifecycle
        .as_ref()
        .and_then(|l| l.pre_stop.as_ref())
        .and_then(|h| h.exec.as_ref())
        .map(|e| e.command[2].as_str())
        .unwrap_or_default()
}

// =============================================================================
// Story: Compiling a regular instance group
// =============================================================================

#[test]
fn compiles_jobs_into_supervised_containers() {
    let dir = release_fixture();
    let images = images();
    let compiler = InstanceGroupCompiler::new(
        Manifest::from_yaml(MANIFEST).unwrap(),
        "app-ns",
        dir.path(),
        &images,
        ConverterConfig::default(),
    );

    let compiled = compiler.compile("ig", &default_mounts(), &Disks::default()).unwrap();

    let names: Vec<_> = compiled.containers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["joba-server", "joba-worker", "jobb-main", "logs"]);

    let server = &compiled.containers[0];
    assert_eq!(server.image, "registry/ig-jobA:1");
    assert_eq!(
        server.args[server.args.len() - 3..],
        [
            "/var/vcap/packages/a/bin/server",
            "--db",
            "db-0-postgres.app-ns.svc.cluster.local:5432"
        ]
    );
    assert_eq!(server.resources.limits["memory"].as_str(), "1Gi");
    assert!(server.readiness_probe.is_some());
    assert!(server.env.iter().any(|e| e.name == "FEATURE"));
    assert_eq!(server.volume_mounts, default_mounts());

    // two jobs have processes, jobC has none
    assert!(pre_stop(server).contains("touch /mnt/drain-stamps/jobA"));
    assert!(pre_stop(server).contains("-lt 2 ]"));
    assert!(pre_stop(&compiled.containers[1]).contains("Wait for drain scripts"));
    assert!(pre_stop(&compiled.containers[2]).contains("touch /mnt/drain-stamps/jobB"));
}

#[test]
fn resolved_jobs_are_returned() {
    let dir = release_fixture();
    let images = images();
    let compiler = InstanceGroupCompiler::new(
        Manifest::from_yaml(MANIFEST).unwrap(),
        "app-ns",
        dir.path(),
        &images,
        ConverterConfig::default(),
    );

    let compiled = compiler.compile("ig", &[], &Disks::default()).unwrap();
    let job_a = &compiled.jobs[0];
    assert_eq!(job_a.resolved.release.as_deref(), Some("r"));
    assert_eq!(job_a.resolved.instances.len(), 2);
    assert!(job_a.resolved.consumes.contains_key("database"));
    assert!(!job_a.resolved.consumes.contains_key("cache"));
    assert!(compiled.jobs[2].resolved.bpm.as_ref().is_some_and(|c| !c.has_processes()));
}

#[test]
fn cluster_domain_and_sidecar_settings_apply() {
    let dir = release_fixture();
    let images = images();
    let config = ConverterConfig::default()
        .with_cluster_domain("example.internal")
        .with_log_sidecar_disabled(true);
    let compiler = InstanceGroupCompiler::new(
        Manifest::from_yaml(MANIFEST).unwrap(),
        "app-ns",
        dir.path(),
        &images,
        config,
    );

    let compiled = compiler.compile("ig", &[], &Disks::default()).unwrap();
    assert_eq!(compiled.containers.len(), 3);
    assert!(compiled.containers[0]
        .args
        .contains(&"db-0-postgres.app-ns.svc.example.internal:5432".to_string()));
}

#[test]
fn compiled_output_uses_kubernetes_field_names() {
    let dir = release_fixture();
    let images = images();
    let compiler = InstanceGroupCompiler::new(
        Manifest::from_yaml(MANIFEST).unwrap(),
        "app-ns",
        dir.path(),
        &images,
        ConverterConfig::default(),
    );

    let compiled = compiler.compile("ig", &default_mounts(), &Disks::default()).unwrap();
    let json = serde_json::to_value(&compiled.containers[0]).unwrap();
    assert_eq!(json["workingDir"], "/var/vcap/jobs/jobA");
    assert_eq!(json["volumeMounts"][0]["mountPath"], "/var/vcap/all-releases");
    assert!(json["lifecycle"]["preStop"]["exec"]["command"].is_array());
    assert!(json.get("readinessProbe").is_some());
}

// =============================================================================
// Story: Errand groups
// =============================================================================

#[test]
fn errand_group_runs_processes_directly() {
    let dir = release_fixture();
    let images = images();
    let compiler = InstanceGroupCompiler::new(
        Manifest::from_yaml(MANIFEST).unwrap(),
        "app-ns",
        dir.path(),
        &images,
        ConverterConfig::default(),
    );

    let compiled = compiler
        .compile("smoke-tests", &default_mounts(), &Disks::default())
        .unwrap();
    assert_eq!(compiled.containers.len(), 2);
    let smoke = &compiled.containers[0];
    assert_eq!(smoke.command, vec!["/usr/bin/dumb-init", "--"]);
    assert_eq!(smoke.args, vec!["/var/vcap/packages/smoke/bin/run", "--all"]);
    assert_eq!(pre_stop(smoke), "");
}

// =============================================================================
// Story: Failures
// =============================================================================

#[test]
fn unknown_instance_group_fails() {
    let dir = release_fixture();
    let images = images();
    let compiler = InstanceGroupCompiler::new(
        Manifest::from_yaml(MANIFEST).unwrap(),
        "app-ns",
        dir.path(),
        &images,
        ConverterConfig::default(),
    );

    let err = compiler.compile("api", &[], &Disks::default()).unwrap_err();
    assert!(matches!(err, Error::InstanceGroupNotFound(_)));
}

#[test]
fn missing_mandatory_provider_fails() {
    let dir = release_fixture();
    let images = images();
    let manifest = MANIFEST.replace("database: {from: primary-db}", "database: {from: other-db}");
    let compiler = InstanceGroupCompiler::new(
        Manifest::from_yaml(&manifest).unwrap(),
        "app-ns",
        dir.path(),
        &images,
        ConverterConfig::default(),
    );

    let err = compiler.compile("ig", &[], &Disks::default()).unwrap_err();
    assert!(
        matches!(err, Error::UnresolvedLink { ref consumer, ref name, .. } if consumer == "database" && name == "other-db")
    );
}

#[test]
fn bogus_memory_limit_fails() {
    let dir = release_fixture();
    let images = images();
    let manifest = MANIFEST.replace("memory: 1Gi", "memory: bogus");
    let compiler = InstanceGroupCompiler::new(
        Manifest::from_yaml(&manifest).unwrap(),
        "app-ns",
        dir.path(),
        &images,
        ConverterConfig::default(),
    );

    let err = compiler.compile("ig", &[], &Disks::default()).unwrap_err();
    assert!(matches!(err, Error::QuantityParse { ref job, .. } if job == "jobA"));
}
