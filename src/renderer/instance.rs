use anyhow::anyhow;
use ash::{ext, vk, Entry};
use std::ffi::{c_char, CStr};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Routes validation messages into `log` at the matching level.
pub struct DebugUtils {
    messenger: vk::DebugUtilsMessengerEXT,
    loader: ext::debug_utils::Instance,
}

impl DebugUtils {
    pub fn new(entry: &Entry, instance: &ash::Instance) -> anyhow::Result<Self> {
        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(Self::callback));
        let loader = ext::debug_utils::Instance::new(entry, instance);
        let messenger = unsafe { loader.create_debug_utils_messenger(&debug_info, None)? };

        Ok(Self { messenger, loader })
    }

    pub fn destroy(&self) {
        unsafe {
            self.loader
                .destroy_debug_utils_messenger(self.messenger, None)
        };
    }

    unsafe extern "system" fn callback(
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT,
        p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
        _user_data: *mut std::os::raw::c_void,
    ) -> vk::Bool32 {
        let data = *p_callback_data;
        let id_name = if data.p_message_id_name.is_null() {
            std::borrow::Cow::from("")
        } else {
            CStr::from_ptr(data.p_message_id_name).to_string_lossy()
        };
        let message = if data.p_message.is_null() {
            std::borrow::Cow::from("")
        } else {
            CStr::from_ptr(data.p_message).to_string_lossy()
        };
        let line = format!(
            "[{:?}] [{}] ({}): {}",
            message_type, id_name, data.message_id_number, message
        );

        match severity {
            s if s.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) => log::error!("{line}"),
            s if s.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) => log::warn!("{line}"),
            // Loader chatter is noisy at info.
            s if s.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) => log::debug!("{line}"),
            _ => log::trace!("{line}"),
        }

        vk::FALSE
    }
}

pub struct Instance {
    pub entry: Entry,
    pub instance: ash::Instance,

    debug_utils: Option<DebugUtils>,
}

impl Instance {
    /// `window_extensions` are the surface extensions the windowing system
    /// asks for.
    pub fn new(
        entry: Entry,
        window_extensions: &[*const c_char],
        enable_validation: bool,
    ) -> anyhow::Result<Self> {
        let app_name = c"lightbox";
        let layers = if enable_validation {
            Self::validation_layers(&entry)?
        } else {
            vec![]
        };
        let enable_validation = enable_validation && !layers.is_empty();
        let extensions = Self::required_instance_extensions(&entry, window_extensions, enable_validation)?;
        let version =
            unsafe { entry.try_enumerate_instance_version()? }.unwrap_or(vk::API_VERSION_1_0);

        let app_info = vk::ApplicationInfo::default()
            .application_name(app_name)
            .engine_name(app_name)
            .engine_version(0)
            .api_version(version);

        let create_flags = if cfg!(any(target_os = "macos", target_os = "ios")) {
            vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
        } else {
            vk::InstanceCreateFlags::default()
        };

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions)
            .flags(create_flags);

        let instance = unsafe { entry.create_instance(&create_info, None)? };
        let debug_utils = if enable_validation {
            Some(DebugUtils::new(&entry, &instance)?)
        } else {
            None
        };
        log::info!(
            "Created Vulkan {}.{} instance, validation {}",
            vk::api_version_major(version),
            vk::api_version_minor(version),
            if enable_validation { "on" } else { "off" }
        );

        Ok(Self {
            entry,
            instance,
            debug_utils,
        })
    }

    pub fn destroy(&self) {
        unsafe {
            if let Some(debug_utils) = &self.debug_utils {
                debug_utils.destroy();
            }
            self.instance.destroy_instance(None);
        }
    }

    fn validation_layers(entry: &Entry) -> anyhow::Result<Vec<*const c_char>> {
        let available = unsafe { entry.enumerate_instance_layer_properties()? };
        let found = available
            .iter()
            .any(|layer| unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) } == VALIDATION_LAYER);
        if found {
            Ok(vec![VALIDATION_LAYER.as_ptr()])
        } else {
            log::warn!("{} not installed, running without validation", VALIDATION_LAYER.to_string_lossy());
            Ok(vec![])
        }
    }

    fn required_instance_extensions(
        entry: &Entry,
        window_extensions: &[*const c_char],
        enable_validation: bool,
    ) -> anyhow::Result<Vec<*const c_char>> {
        let mut required = window_extensions
            .iter()
            .map(|&name| unsafe { CStr::from_ptr(name) })
            .collect::<Vec<_>>();
        if enable_validation {
            required.push(vk::EXT_DEBUG_UTILS_NAME);
        }
        if cfg!(any(target_os = "macos", target_os = "ios")) {
            required.push(vk::KHR_PORTABILITY_ENUMERATION_NAME);
        }

        let system_extensions = unsafe { entry.enumerate_instance_extension_properties(None)? };
        let system_names = system_extensions
            .iter()
            .map(|extension| unsafe { CStr::from_ptr(extension.extension_name.as_ptr()) })
            .collect::<Vec<_>>();
        for name in &required {
            if !system_names.contains(name) {
                return Err(anyhow!(
                    "extension {} not supported by the system",
                    name.to_string_lossy()
                ));
            }
        }
        Ok(required.iter().map(|name| name.as_ptr()).collect())
    }
}
