//! Step catalog used by the scanners' generators.

use super::model::Step;

pub fn activate_ssh_key() -> Step {
    Step::new("activate-ssh-key@4").input("ssh_rsa_private_key", "$SSH_RSA_PRIVATE_KEY")
}

pub fn git_clone() -> Step {
    Step::new("git-clone@8")
}

pub fn restore_cache(key: &str) -> Step {
    Step::new("restore-cache@2").input("key", key)
}

pub fn save_cache(key: &str, paths: &str) -> Step {
    Step::new("save-cache@1").input("key", key).input("paths", paths)
}

pub fn deploy_to_bitrise_io() -> Step {
    Step::new("deploy-to-bitrise-io@2")
}

pub fn script(title: &str, content: &str) -> Step {
    Step::new("script@1").title(title).input("content", content)
}

pub fn certificate_and_profile_installer() -> Step {
    Step::new("certificate-and-profile-installer@1")
}

// Android

pub fn install_missing_android_tools(gradlew_path: &str) -> Step {
    Step::new("install-missing-android-tools@3").input("gradlew_path", gradlew_path)
}

pub fn android_unit_test(project_location: &str) -> Step {
    Step::new("android-unit-test@1").input("project_location", project_location)
}

pub fn gradle_runner(project_location: &str, task: &str) -> Step {
    Step::new("gradle-runner@2")
        .input("gradle_task", task)
        .input("gradlew_path", format!("{}/gradlew", project_location))
}

pub fn sign_apk() -> Step {
    Step::new("sign-apk@1").title("Sign the built APK or AAB")
}

// Xcode

pub fn cocoapods_install() -> Step {
    Step::new("cocoapods-install@2")
}

pub fn carthage(command: &str) -> Step {
    Step::new("carthage@3").input("carthage_command", command)
}

pub fn recreate_user_schemes(project_path: &str) -> Step {
    Step::new("recreate-user-schemes@1").input("project_path", project_path)
}

pub fn xcode_test(project_path: &str, scheme: &str) -> Step {
    Step::new("xcode-test@5")
        .input("project_path", project_path)
        .input("scheme", scheme)
}

pub fn xcode_build_for_simulator(project_path: &str, scheme: &str) -> Step {
    Step::new("xcode-build-for-simulator@0")
        .input("project_path", project_path)
        .input("scheme", scheme)
}

pub fn export_app_clip(distribution_method: &str) -> Step {
    Step::new("export-xcarchive@4")
        .title("Export App Clip")
        .input("product", "app-clip")
        .input("distribution_method", distribution_method)
}

pub fn xcode_archive(project_path: &str, scheme: &str, distribution_method: &str) -> Step {
    Step::new("xcode-archive@5")
        .input("project_path", project_path)
        .input("scheme", scheme)
        .input("distribution_method", distribution_method)
        .input("automatic_code_signing", "api-key")
}

pub fn xcode_archive_mac(project_path: &str, scheme: &str, export_method: &str) -> Step {
    Step::new("xcode-archive-mac@1")
        .input("project_path", project_path)
        .input("scheme", scheme)
        .input("export_method", export_method)
}

pub fn xcode_test_mac(project_path: &str, scheme: &str) -> Step {
    Step::new("xcode-test-mac@1")
        .input("project_path", project_path)
        .input("scheme", scheme)
}

// JavaScript tooling

pub fn npm(workdir: &str, command: &str) -> Step {
    Step::new("npm@1")
        .input("workdir", workdir)
        .input("command", command)
}

pub fn yarn(workdir: &str, command: &str) -> Step {
    Step::new("yarn@0")
        .input("workdir", workdir)
        .input("command", command)
}

pub fn karma_jasmine_runner(workdir: &str) -> Step {
    Step::new("karma-jasmine-runner@0").input("workdir", workdir)
}

pub fn jasmine_runner(workdir: &str) -> Step {
    Step::new("jasmine-runner@0").input("workdir", workdir)
}

pub fn generate_cordova_build_configuration() -> Step {
    Step::new("generate-cordova-build-configuration@0")
}

pub fn cordova_archive(workdir: &str, platform: &str) -> Step {
    Step::new("cordova-archive@3")
        .input("workdir", workdir)
        .input("platform", platform)
        .input("target", "emulator")
}

pub fn ionic_archive(workdir: &str, platform: &str) -> Step {
    Step::new("ionic-archive@2")
        .input("workdir", workdir)
        .input("platform", platform)
        .input("target", "emulator")
}

// Flutter

pub fn flutter_installer() -> Step {
    Step::new("flutter-installer@0").input("is_update", "false")
}

pub fn flutter_analyze(project_location: &str) -> Step {
    Step::new("flutter-analyze@0").input("project_location", project_location)
}

pub fn flutter_test(project_location: &str) -> Step {
    Step::new("flutter-test@1").input("project_location", project_location)
}

pub fn flutter_build(project_location: &str, platform: &str) -> Step {
    Step::new("flutter-build@0")
        .input("project_location", project_location)
        .input("platform", platform)
}

// Xamarin

pub fn nuget_restore() -> Step {
    Step::new("nuget-restore@1")
}

pub fn xamarin_components_restore() -> Step {
    Step::new("xamarin-components-restore@0")
}

pub fn xamarin_archive(solution: &str, configuration: &str, platform: &str) -> Step {
    Step::new("xamarin-archive@1")
        .input("xamarin_solution", solution)
        .input("xamarin_configuration", configuration)
        .input("xamarin_platform", platform)
}

// fastlane

pub fn fastlane(lane: &str, work_dir: &str) -> Step {
    Step::new("fastlane@3")
        .input("lane", lane)
        .input("work_dir", work_dir)
}
