//! Visitor counting core: frame quality scoring and online identity
//! deduplication over a live video stream.

pub mod shared {
    pub mod config;
    pub mod face_region;
    pub mod frame;
    pub mod model_resolver;
}

pub mod quality {
    pub mod domain {
        pub mod frame_scorer;
        pub mod head_pose;
        pub mod pixel_stats;
        pub mod quality_gate;
        pub mod quality_score;
    }
}

pub mod recognition {
    pub mod domain {
        pub mod embedding;
        pub mod embedding_provider;
        pub mod identity_matcher;
        pub mod visitor_store;
    }
    pub mod infrastructure {
        pub mod arcface_embedder;
        pub mod execution_provider;
        pub mod onnx_embedding_provider;
        pub mod onnx_face_detector;
        pub mod sqlite_visitor_store;
    }
}

pub mod counting {
    pub mod domain {
        pub mod clock;
        pub mod controller;
        pub mod known_identities;
        pub mod session_stats;
    }
}

pub mod pipeline {
    pub mod count_visitors_use_case;
    pub mod debug_report;
    pub mod run_logger;
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
        pub mod snapshot_writer;
    }
    pub mod infrastructure {
        pub mod ffmpeg_source;
        pub mod jpeg_snapshot_writer;
    }
}
