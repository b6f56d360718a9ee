//! Provider operation names

// EC2
pub const CREATE_VOLUME: &str = "ec2:CreateVolume";
pub const DESCRIBE_VOLUMES: &str = "ec2:DescribeVolumes";
pub const DELETE_VOLUME: &str = "ec2:DeleteVolume";
pub const ATTACH_VOLUME: &str = "ec2:AttachVolume";
pub const DETACH_VOLUME: &str = "ec2:DetachVolume";
pub const MODIFY_VOLUME: &str = "ec2:ModifyVolume";

pub const RUN_INSTANCES: &str = "ec2:RunInstances";
pub const DESCRIBE_INSTANCES: &str = "ec2:DescribeInstances";
pub const START_INSTANCES: &str = "ec2:StartInstances";
pub const STOP_INSTANCES: &str = "ec2:StopInstances";
pub const REBOOT_INSTANCES: &str = "ec2:RebootInstances";
pub const TERMINATE_INSTANCES: &str = "ec2:TerminateInstances";

pub const CREATE_IMAGE: &str = "ec2:CreateImage";
pub const DESCRIBE_IMAGES: &str = "ec2:DescribeImages";
pub const DEREGISTER_IMAGE: &str = "ec2:DeregisterImage";

pub const CREATE_KEY_PAIR: &str = "ec2:CreateKeyPair";
pub const DESCRIBE_KEY_PAIRS: &str = "ec2:DescribeKeyPairs";
pub const DELETE_KEY_PAIR: &str = "ec2:DeleteKeyPair";

pub const CREATE_SECURITY_GROUP: &str = "ec2:CreateSecurityGroup";
pub const DESCRIBE_SECURITY_GROUPS: &str = "ec2:DescribeSecurityGroups";
pub const DELETE_SECURITY_GROUP: &str = "ec2:DeleteSecurityGroup";
pub const AUTHORIZE_INGRESS: &str = "ec2:AuthorizeSecurityGroupIngress";
pub const AUTHORIZE_EGRESS: &str = "ec2:AuthorizeSecurityGroupEgress";
pub const REVOKE_INGRESS: &str = "ec2:RevokeSecurityGroupIngress";
pub const REVOKE_EGRESS: &str = "ec2:RevokeSecurityGroupEgress";

pub const ALLOCATE_ADDRESS: &str = "ec2:AllocateAddress";
pub const DESCRIBE_ADDRESSES: &str = "ec2:DescribeAddresses";
pub const RELEASE_ADDRESS: &str = "ec2:ReleaseAddress";
pub const ASSOCIATE_ADDRESS: &str = "ec2:AssociateAddress";
pub const DISASSOCIATE_ADDRESS: &str = "ec2:DisassociateAddress";

pub const CREATE_VPC: &str = "ec2:CreateVpc";
pub const DESCRIBE_VPCS: &str = "ec2:DescribeVpcs";
pub const DELETE_VPC: &str = "ec2:DeleteVpc";
pub const CREATE_SUBNET: &str = "ec2:CreateSubnet";
pub const DESCRIBE_SUBNETS: &str = "ec2:DescribeSubnets";
pub const DELETE_SUBNET: &str = "ec2:DeleteSubnet";
pub const CREATE_INTERNET_GATEWAY: &str = "ec2:CreateInternetGateway";
pub const DESCRIBE_INTERNET_GATEWAYS: &str = "ec2:DescribeInternetGateways";
pub const ATTACH_INTERNET_GATEWAY: &str = "ec2:AttachInternetGateway";
pub const DETACH_INTERNET_GATEWAY: &str = "ec2:DetachInternetGateway";
pub const DELETE_INTERNET_GATEWAY: &str = "ec2:DeleteInternetGateway";
pub const DESCRIBE_ROUTE_TABLES: &str = "ec2:DescribeRouteTables";
pub const CREATE_ROUTE: &str = "ec2:CreateRoute";
pub const DELETE_ROUTE: &str = "ec2:DeleteRoute";

pub const DESCRIBE_REGIONS: &str = "ec2:DescribeRegions";
pub const DESCRIBE_AVAILABILITY_ZONES: &str = "ec2:DescribeAvailabilityZones";

// Resource tagging
pub const TAG_RESOURCES: &str = "tagging:TagResources";
pub const UNTAG_RESOURCES: &str = "tagging:UntagResources";
pub const GET_RESOURCES: &str = "tagging:GetResources";

// Elastic load balancing
pub const CREATE_TARGET_GROUP: &str = "elbv2:CreateTargetGroup";
pub const DESCRIBE_TARGET_GROUPS: &str = "elbv2:DescribeTargetGroups";
pub const MODIFY_TARGET_GROUP: &str = "elbv2:ModifyTargetGroup";
pub const DELETE_TARGET_GROUP: &str = "elbv2:DeleteTargetGroup";
pub const REGISTER_TARGETS: &str = "elbv2:RegisterTargets";
pub const DEREGISTER_TARGETS: &str = "elbv2:DeregisterTargets";
pub const DESCRIBE_TARGET_HEALTH: &str = "elbv2:DescribeTargetHealth";
pub const CREATE_LISTENER: &str = "elbv2:CreateListener";
pub const DESCRIBE_LISTENERS: &str = "elbv2:DescribeListeners";
pub const MODIFY_LISTENER: &str = "elbv2:ModifyListener";
pub const DELETE_LISTENER: &str = "elbv2:DeleteListener";
pub const CREATE_LOAD_BALANCER: &str = "elbv2:CreateLoadBalancer";
pub const DESCRIBE_LOAD_BALANCERS: &str = "elbv2:DescribeLoadBalancers";
pub const DELETE_LOAD_BALANCER: &str = "elbv2:DeleteLoadBalancer";

// IAM
pub const GET_ROLE: &str = "iam:GetRole";

// EKS
pub const CREATE_CLUSTER: &str = "eks:CreateCluster";
pub const DESCRIBE_CLUSTER: &str = "eks:DescribeCluster";
pub const LIST_CLUSTERS: &str = "eks:ListClusters";
pub const DELETE_CLUSTER: &str = "eks:DeleteCluster";
pub const CREATE_NODEGROUP: &str = "eks:CreateNodegroup";
pub const DESCRIBE_NODEGROUP: &str = "eks:DescribeNodegroup";
pub const LIST_NODEGROUPS: &str = "eks:ListNodegroups";
pub const DELETE_NODEGROUP: &str = "eks:DeleteNodegroup";
pub const UPDATE_NODEGROUP_CONFIG: &str = "eks:UpdateNodegroupConfig";

// Auto scaling
pub const DESCRIBE_AUTO_SCALING_GROUPS: &str = "autoscaling:DescribeAutoScalingGroups";
