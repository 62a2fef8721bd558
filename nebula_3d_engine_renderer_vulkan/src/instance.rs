/// Vulkan instance and device bring-up
///
/// Creates the entry/instance pair (with optional validation layers and a
/// debug messenger routed to the console), picks a physical device, resolves
/// the graphics and present queue families against the window surface, and
/// creates the logical device plus the GPU memory allocator.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use nebula_3d_engine::nebula3d::EngineContext;
use nebula_3d_engine::{engine_error, engine_info, Error, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::renderer::RendererConfig;

/// Everything the renderer needs from device bring-up
pub struct DeviceBundle {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
    pub present_queue: vk::Queue,
    pub present_queue_family: u32,
    pub surface: vk::SurfaceKHR,
    pub surface_loader: ash::khr::surface::Instance,
    pub limits: vk::PhysicalDeviceLimits,
}

impl DeviceBundle {
    /// Create the instance, surface, device and queues
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        ctx: &EngineContext,
        window: &W,
        config: &RendererConfig,
    ) -> Result<Self> {
        unsafe {
            // Create Vulkan entry
            let entry = ash::Entry::load().map_err(|e| {
                engine_error!(ctx, "nebula3d::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            // Application info
            let app_name = std::ffi::CString::new(config.app_name.clone()).map_err(|e| {
                Error::InitializationFailed(format!("Invalid application name: {:?}", e))
            })?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Nebula3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            // Get required extensions
            let display_handle = window.display_handle().map_err(|e| {
                engine_error!(ctx, "nebula3d::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let mut extension_names =
                ash_window::enumerate_required_extensions(display_handle.as_raw())
                    .map_err(|e| {
                        engine_error!(ctx, "nebula3d::vulkan", "Failed to get required extensions: {}", e);
                        Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                    })?
                    .to_vec();

            // Add debug utils extension if validation is enabled
            if config.enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            // Validation layers
            let layer_names = if config.enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                engine_error!(ctx, "nebula3d::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            // Setup debug messenger if validation is enabled
            let (debug_utils_loader, debug_messenger) = if config.enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(
                        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                    )
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

                let messenger = debug_utils
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| {
                        engine_error!(ctx, "nebula3d::vulkan", "Failed to create debug messenger: {:?}", e);
                        Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
                    })?;

                (Some(debug_utils), Some(messenger))
            } else {
                (None, None)
            };

            // Create surface (kept for swapchain creation)
            let window_handle = window.window_handle().map_err(|e| {
                engine_error!(ctx, "nebula3d::vulkan", "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_error!(ctx, "nebula3d::vulkan", "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            // Pick physical device
            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                engine_error!(ctx, "nebula3d::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

            let physical_device = physical_devices.into_iter().next().ok_or_else(|| {
                engine_error!(ctx, "nebula3d::vulkan", "No Vulkan-capable GPU found");
                Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
            })?;

            let properties = instance.get_physical_device_properties(physical_device);

            // Find queue families
            let queue_families =
                instance.get_physical_device_queue_family_properties(physical_device);

            let graphics_queue_family = queue_families
                .iter()
                .enumerate()
                .find(|(_, qf)| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|(i, _)| i as u32)
                .ok_or_else(|| {
                    engine_error!(ctx, "nebula3d::vulkan", "No graphics queue family found");
                    Error::InitializationFailed("No graphics queue family found".to_string())
                })?;

            let present_queue_family = (0..queue_families.len() as u32)
                .find(|&i| {
                    surface_loader
                        .get_physical_device_surface_support(physical_device, i, surface)
                        .unwrap_or(false)
                })
                .ok_or_else(|| {
                    engine_error!(ctx, "nebula3d::vulkan", "No present queue family found");
                    Error::InitializationFailed("No present queue family found".to_string())
                })?;

            // Create logical device
            let queue_priorities = [1.0];
            let queue_create_infos = if graphics_queue_family == present_queue_family {
                vec![vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(graphics_queue_family)
                    .queue_priorities(&queue_priorities)]
            } else {
                vec![
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(graphics_queue_family)
                        .queue_priorities(&queue_priorities),
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(present_queue_family)
                        .queue_priorities(&queue_priorities),
                ]
            };

            let device_extension_names = vec![ash::khr::swapchain::NAME.as_ptr()];

            let device_features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!(ctx, "nebula3d::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let graphics_queue = device.get_device_queue(graphics_queue_family, 0);
            let present_queue = device.get_device_queue(present_queue_family, 0);

            engine_info!(
                ctx,
                "nebula3d::vulkan",
                "Device created (graphics family {}, present family {})",
                graphics_queue_family,
                present_queue_family
            );

            Ok(Self {
                entry,
                instance,
                debug_utils_loader,
                debug_messenger,
                physical_device,
                device,
                graphics_queue,
                graphics_queue_family,
                present_queue,
                present_queue_family,
                surface,
                surface_loader,
                limits: properties.limits,
            })
        }
    }

    /// Create the GPU memory allocator for this device
    pub fn create_allocator(&self, ctx: &EngineContext) -> Result<Allocator> {
        Allocator::new(&AllocatorCreateDesc {
            instance: self.instance.clone(),
            device: self.device.clone(),
            physical_device: self.physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| {
            engine_error!(ctx, "nebula3d::vulkan", "Failed to create GPU allocator: {:?}", e);
            Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
        })
    }
}
