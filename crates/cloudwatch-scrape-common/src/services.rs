//! Supported discovery services.
//!
//! Each service maps a discovery job `type` to its CloudWatch namespace, the
//! API its resources are enumerated from, and the rule that turns a resource
//! ARN into the dimension CloudWatch keys its metrics by.
//!
//! Most services are enumerated through the tagging API with the service's
//! resource type filters. Auto Scaling groups are listed directly, since the
//! tagging API doesn't return them.
//!
//! | Type | Namespace | Dimension |
//! |------|-----------|-----------|
//! | `ec2` | `AWS/EC2` | `InstanceId` |
//! | `ebs` | `AWS/EBS` | `VolumeId` |
//! | `rds` | `AWS/RDS` | `DBInstanceIdentifier` |
//! | `s3` | `AWS/S3` | `BucketName` |
//! | `sqs` | `AWS/SQS` | `QueueName` |
//! | `sns` | `AWS/SNS` | `TopicName` |
//! | `lambda` | `AWS/Lambda` | `FunctionName` |
//! | `dynamodb` | `AWS/DynamoDB` | `TableName` |
//! | `es` | `AWS/ES` | `DomainName` |
//! | `elb` | `AWS/ELB` | `LoadBalancerName` |
//! | `alb` | `AWS/ApplicationELB` | `LoadBalancer` |
//! | `nlb` | `AWS/NetworkELB` | `LoadBalancer` |
//! | `kinesis` | `AWS/Kinesis` | `StreamName` |
//! | `firehose` | `AWS/Firehose` | `DeliveryStreamName` |
//! | `ngw` | `AWS/NATGateway` | `NatGatewayId` |
//! | `efs` | `AWS/EFS` | `FileSystemId` |
//! | `ec` | `AWS/ElastiCache` | `CacheClusterId` |
//! | `sfn` | `AWS/States` | `StateMachineArn` |
//! | `acm-certificates` | `AWS/CertificateManager` | `CertificateArn` |
//! | `asg` | `AWS/AutoScaling` | `AutoScalingGroupName` |

/// How a resource ARN maps to the value of the service's primary dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionRule {
    /// The text after the last occurrence of `marker`
    ArnSuffix {
        dimension: &'static str,
        marker: &'static str,
    },
    /// The ARN itself
    FullArn { dimension: &'static str },
    /// The longest catalog value of `dimension` that the ARN ends with
    CatalogSuffix { dimension: &'static str },
}

impl DimensionRule {
    pub fn dimension(&self) -> &'static str {
        match self {
            DimensionRule::ArnSuffix { dimension, .. }
            | DimensionRule::FullArn { dimension }
            | DimensionRule::CatalogSuffix { dimension } => dimension,
        }
    }
}

/// API a service's resources are enumerated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceSource {
    /// Resource Groups Tagging API, filtered by resource type
    Tagging,
    /// DescribeAutoScalingGroups
    AutoScaling,
}

/// Static description of one discovery service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Job `type` value
    pub name: &'static str,
    /// CloudWatch namespace
    pub namespace: &'static str,
    /// Service segment of the resource ARN
    pub arn_service: &'static str,
    /// Resource type filters for the tagging API
    pub resource_type_filters: &'static [&'static str],
    pub source: ResourceSource,
    pub rule: DimensionRule,
}

impl ServiceDescriptor {
    /// Build a resource id that resolves back to `value` under this service's rule.
    ///
    /// Used when resources are inferred from the metric catalog instead of the
    /// tagging API, so the inferred resource has no real ARN.
    pub fn synthesize_resource_id(&self, region: &str, value: &str) -> String {
        match self.rule {
            DimensionRule::FullArn { .. } => value.to_string(),
            DimensionRule::ArnSuffix { marker, .. } => {
                format!("arn:aws:{}:{}:{}{}", self.arn_service, region, marker, value)
            }
            DimensionRule::CatalogSuffix { .. } => {
                format!("arn:aws:{}:{}::{}", self.arn_service, region, value)
            }
        }
    }
}

const fn suffix(dimension: &'static str, marker: &'static str) -> DimensionRule {
    DimensionRule::ArnSuffix { dimension, marker }
}

/// All supported discovery services
pub const SERVICES: &[ServiceDescriptor] = &[
    ServiceDescriptor {
        name: "ec2",
        namespace: "AWS/EC2",
        arn_service: "ec2",
        resource_type_filters: &["ec2:instance"],
        source: ResourceSource::Tagging,
        rule: suffix("InstanceId", "instance/"),
    },
    ServiceDescriptor {
        name: "ebs",
        namespace: "AWS/EBS",
        arn_service: "ec2",
        resource_type_filters: &["ec2:volume"],
        source: ResourceSource::Tagging,
        rule: suffix("VolumeId", "volume/"),
    },
    ServiceDescriptor {
        name: "rds",
        namespace: "AWS/RDS",
        arn_service: "rds",
        resource_type_filters: &["rds:db"],
        source: ResourceSource::Tagging,
        rule: suffix("DBInstanceIdentifier", ":db:"),
    },
    ServiceDescriptor {
        name: "s3",
        namespace: "AWS/S3",
        arn_service: "s3",
        resource_type_filters: &["s3"],
        source: ResourceSource::Tagging,
        rule: suffix("BucketName", ":::"),
    },
    ServiceDescriptor {
        name: "sqs",
        namespace: "AWS/SQS",
        arn_service: "sqs",
        resource_type_filters: &["sqs"],
        source: ResourceSource::Tagging,
        rule: suffix("QueueName", ":"),
    },
    ServiceDescriptor {
        name: "sns",
        namespace: "AWS/SNS",
        arn_service: "sns",
        resource_type_filters: &["sns"],
        source: ResourceSource::Tagging,
        rule: suffix("TopicName", ":"),
    },
    ServiceDescriptor {
        name: "lambda",
        namespace: "AWS/Lambda",
        arn_service: "lambda",
        resource_type_filters: &["lambda:function"],
        source: ResourceSource::Tagging,
        rule: suffix("FunctionName", ":function:"),
    },
    ServiceDescriptor {
        name: "dynamodb",
        namespace: "AWS/DynamoDB",
        arn_service: "dynamodb",
        resource_type_filters: &["dynamodb:table"],
        source: ResourceSource::Tagging,
        rule: suffix("TableName", ":table/"),
    },
    ServiceDescriptor {
        name: "es",
        namespace: "AWS/ES",
        arn_service: "es",
        resource_type_filters: &["es:domain"],
        source: ResourceSource::Tagging,
        rule: suffix("DomainName", ":domain/"),
    },
    ServiceDescriptor {
        name: "elb",
        namespace: "AWS/ELB",
        arn_service: "elasticloadbalancing",
        resource_type_filters: &["elasticloadbalancing:loadbalancer"],
        source: ResourceSource::Tagging,
        rule: suffix("LoadBalancerName", "loadbalancer/"),
    },
    ServiceDescriptor {
        name: "alb",
        namespace: "AWS/ApplicationELB",
        arn_service: "elasticloadbalancing",
        resource_type_filters: &["elasticloadbalancing:loadbalancer/app"],
        source: ResourceSource::Tagging,
        rule: suffix("LoadBalancer", "loadbalancer/"),
    },
    ServiceDescriptor {
        name: "nlb",
        namespace: "AWS/NetworkELB",
        arn_service: "elasticloadbalancing",
        resource_type_filters: &["elasticloadbalancing:loadbalancer/net"],
        source: ResourceSource::Tagging,
        rule: suffix("LoadBalancer", "loadbalancer/"),
    },
    ServiceDescriptor {
        name: "kinesis",
        namespace: "AWS/Kinesis",
        arn_service: "kinesis",
        resource_type_filters: &["kinesis:stream"],
        source: ResourceSource::Tagging,
        rule: suffix("StreamName", ":stream/"),
    },
    ServiceDescriptor {
        name: "firehose",
        namespace: "AWS/Firehose",
        arn_service: "firehose",
        resource_type_filters: &["firehose"],
        source: ResourceSource::Tagging,
        rule: suffix("DeliveryStreamName", ":deliverystream/"),
    },
    ServiceDescriptor {
        name: "ngw",
        namespace: "AWS/NATGateway",
        arn_service: "ec2",
        resource_type_filters: &["ec2:natgateway"],
        source: ResourceSource::Tagging,
        rule: suffix("NatGatewayId", "natgateway/"),
    },
    ServiceDescriptor {
        name: "efs",
        namespace: "AWS/EFS",
        arn_service: "elasticfilesystem",
        resource_type_filters: &["elasticfilesystem:file-system"],
        source: ResourceSource::Tagging,
        rule: suffix("FileSystemId", "file-system/"),
    },
    ServiceDescriptor {
        name: "ec",
        namespace: "AWS/ElastiCache",
        arn_service: "elasticache",
        resource_type_filters: &["elasticache:cluster"],
        source: ResourceSource::Tagging,
        rule: DimensionRule::CatalogSuffix {
            dimension: "CacheClusterId",
        },
    },
    ServiceDescriptor {
        name: "sfn",
        namespace: "AWS/States",
        arn_service: "states",
        resource_type_filters: &["states:stateMachine"],
        source: ResourceSource::Tagging,
        rule: DimensionRule::FullArn {
            dimension: "StateMachineArn",
        },
    },
    ServiceDescriptor {
        name: "acm-certificates",
        namespace: "AWS/CertificateManager",
        arn_service: "acm",
        resource_type_filters: &["acm:certificate"],
        source: ResourceSource::Tagging,
        rule: DimensionRule::FullArn {
            dimension: "CertificateArn",
        },
    },
    ServiceDescriptor {
        name: "asg",
        namespace: "AWS/AutoScaling",
        arn_service: "autoscaling",
        resource_type_filters: &["autoscaling:autoScalingGroup"],
        source: ResourceSource::AutoScaling,
        rule: suffix("AutoScalingGroupName", "autoScalingGroupName/"),
    },
];

/// Look up a service by its job `type`
pub fn lookup(name: &str) -> Option<&'static ServiceDescriptor> {
    SERVICES.iter().find(|s| s.name == name)
}
