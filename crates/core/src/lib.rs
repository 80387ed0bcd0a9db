pub mod analysis {
    pub mod domain {
        pub mod face_analyzer;
        pub mod face_order;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod process_image_use_case;
    pub mod process_video_use_case;
    pub mod readiness_gate;
    pub mod run_outcome;
    pub mod run_pipeline_use_case;
}

pub mod policy {
    pub mod domain {
        pub mod content_policy;
    }
    pub mod infrastructure;
}

pub mod processors {
    pub mod domain {
        pub mod enhance_engine;
        pub mod frame_processor;
        pub mod swap_engine;
    }
    pub mod infrastructure;
    pub mod registry;
}

pub mod selection {
    pub mod face_matcher;
    pub mod reference_resolver;
    pub mod reference_store;
}

pub mod shared {
    pub mod constants;
    pub mod face;
    pub mod frame;
    pub mod model_resolver;
    pub mod run_config;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod audio_restorer;
        pub mod frame_extractor;
        pub mod frame_grabber;
        pub mod image_compressor;
        pub mod video_merger;
    }
    pub mod infrastructure;
}

pub mod workspace {
    pub mod temp_workspace;
}
